//! Radius-to-bounding-box conversion.
//!
//! For each direction the angular offset whose geodesic distance from the
//! anchor equals the requested radius is found by bisection. North and south
//! are searched separately because meridian arcs are not symmetric about an
//! arbitrary latitude on the ellipsoid; west mirrors east.
//!
//! An axis that cannot reach the radius before its geometric limit saturates:
//! the edge sits on the pole, or the box spans every longitude. A box that
//! touches a pole spans every longitude too, since every meridian crosses the
//! in-range polar cap.

use std::fmt;

use serde::Serialize;

use super::geo::GeoPoint;
use crate::errors::domain::{ComputationKind, DomainError, ValidationKind};

const FULL_LON_SPAN_DEG: f64 = 180.0;

/// Acceptable gap between the target radius and the distance at the found offset.
pub const DISTANCE_TOLERANCE_KM: f64 = 0.001;

const INITIAL_BOUND_DEG: f64 = 1.0;
const MAX_BISECTION_STEPS: u32 = 128;

/// Latitude/longitude rectangle around an anchor. Longitudes may fall
/// outside [-180, 180] when the box crosses the antimeridian; use
/// [`Area::lon_ranges`] for storage queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Area {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    North,
    South,
    East,
}

impl Direction {
    /// Largest meaningful offset along this axis.
    fn limit(self, anchor: GeoPoint) -> f64 {
        match self {
            Direction::North => 90.0 - anchor.lat,
            Direction::South => anchor.lat + 90.0,
            Direction::East => FULL_LON_SPAN_DEG,
        }
    }

    fn distance_at(self, anchor: GeoPoint, offset: f64) -> f64 {
        let target = match self {
            Direction::North => anchor.offset(offset, 0.0),
            Direction::South => anchor.offset(-offset, 0.0),
            Direction::East => anchor.offset(0.0, offset),
        };
        anchor.distance_km(&target)
    }
}

/// Compute the search rectangle for `range_km` around `anchor`.
pub fn calculate(anchor: GeoPoint, range_km: f64) -> Result<Area, DomainError> {
    anchor.validate()?;
    if !range_km.is_finite() || range_km <= 0.0 {
        return Err(DomainError::validation(
            ValidationKind::InvalidRange,
            format!("range_km must be a positive number, got {range_km}"),
        ));
    }

    let north = search_offset(anchor, range_km, Direction::North)?;
    let south = search_offset(anchor, range_km, Direction::South)?;
    let reaches_pole =
        north >= Direction::North.limit(anchor) || south >= Direction::South.limit(anchor);
    let east = if reaches_pole {
        FULL_LON_SPAN_DEG
    } else {
        search_offset(anchor, range_km, Direction::East)?
    };

    Ok(Area {
        lat_min: anchor.lat - south,
        lat_max: anchor.lat + north,
        lon_min: anchor.lon - east,
        lon_max: anchor.lon + east,
    })
}

fn search_offset(anchor: GeoPoint, range_km: f64, dir: Direction) -> Result<f64, DomainError> {
    let limit = dir.limit(anchor);
    let mut lo = 0.0_f64;
    let mut hi = INITIAL_BOUND_DEG.min(limit);

    while dir.distance_at(anchor, hi) < range_km - DISTANCE_TOLERANCE_KM {
        if hi >= limit {
            return Ok(limit);
        }
        hi = (hi * 2.0).min(limit);
    }

    for _ in 0..MAX_BISECTION_STEPS {
        let mid = (lo + hi) / 2.0;
        let distance = dir.distance_at(anchor, mid);
        if (range_km - distance).abs() < DISTANCE_TOLERANCE_KM {
            return Ok(mid);
        }
        if distance > range_km {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    Err(DomainError::computation(
        ComputationKind::NoConvergence,
        format!("bisection for {range_km} km {dir:?} did not converge"),
    ))
}

impl Area {
    /// True when `point` lies inside the rectangle, honouring antimeridian wrap.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if point.lat < self.lat_min || point.lat > self.lat_max {
            return false;
        }
        self.lon_ranges()
            .iter()
            .any(|(min, max)| point.lon >= *min && point.lon <= *max)
    }

    /// Longitude intervals inside [-180, 180]; two when the box wraps.
    pub fn lon_ranges(&self) -> Vec<(f64, f64)> {
        if self.lon_max - self.lon_min >= 360.0 {
            return vec![(-180.0, 180.0)];
        }
        if self.lon_min < -180.0 {
            vec![(self.lon_min + 360.0, 180.0), (-180.0, self.lon_max)]
        } else if self.lon_max > 180.0 {
            vec![(self.lon_min, 180.0), (-180.0, self.lon_max - 360.0)]
        } else {
            vec![(self.lon_min, self.lon_max)]
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lat: [{}, {}], Lon: [{}, {}]",
            self.lat_min, self.lat_max, self.lon_min, self.lon_max
        )
    }
}
