use crate::domain::area::{calculate, Area, DISTANCE_TOLERANCE_KM};
use crate::domain::geo::GeoPoint;
use crate::errors::domain::{DomainError, ValidationKind};

fn edge_distances(anchor: GeoPoint, area: &Area) -> (f64, f64, f64, f64) {
    (
        anchor.distance_km(&GeoPoint::new(area.lat_max, anchor.lon)),
        anchor.distance_km(&GeoPoint::new(area.lat_min, anchor.lon)),
        anchor.distance_km(&GeoPoint::new(anchor.lat, area.lon_max)),
        anchor.distance_km(&GeoPoint::new(anchor.lat, area.lon_min)),
    )
}

#[test]
fn edges_sit_at_the_requested_range() {
    let anchor = GeoPoint::new(40.0, -73.0);
    let area = calculate(anchor, 5.0).unwrap();
    let (n, s, e, w) = edge_distances(anchor, &area);
    for d in [n, s, e, w] {
        assert!((d - 5.0).abs() < DISTANCE_TOLERANCE_KM, "edge at {d} km");
    }
}

#[test]
fn north_and_south_offsets_agree() {
    let anchor = GeoPoint::new(40.0, -73.0);
    let area = calculate(anchor, 5.0).unwrap();
    let north = area.lat_max - anchor.lat;
    let south = anchor.lat - area.lat_min;
    // ~111 km per degree of latitude
    assert!((north - south).abs() * 111.0 < 3.0 * DISTANCE_TOLERANCE_KM);
}

#[test]
fn longitude_span_widens_away_from_the_equator() {
    let at_equator = calculate(GeoPoint::new(0.0, 10.0), 5.0).unwrap();
    let at_40 = calculate(GeoPoint::new(40.0, 10.0), 5.0).unwrap();
    let equator_delta = at_equator.lon_max - 10.0;
    let delta_40 = at_40.lon_max - 10.0;
    assert!(delta_40 > equator_delta);
}

#[test]
fn box_is_not_square_off_the_equator() {
    let anchor = GeoPoint::new(60.0, 0.0);
    let area = calculate(anchor, 10.0).unwrap();
    let lat_span = area.lat_max - area.lat_min;
    let lon_span = area.lon_max - area.lon_min;
    assert!(lon_span > 1.5 * lat_span);
}

#[test]
fn rejects_non_positive_range() {
    for range in [0.0, -3.0, f64::INFINITY] {
        let err = calculate(GeoPoint::new(0.0, 0.0), range).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(ValidationKind::InvalidRange, _)
        ));
    }
}

#[test]
fn range_past_the_north_pole_clamps_to_it() {
    let anchor = GeoPoint::new(89.99, 10.0);
    let area = calculate(anchor, 5.0).unwrap();
    assert_eq!(area.lat_max, 90.0);
    assert!(area.lon_max - area.lon_min >= 360.0);
    assert_eq!(area.lon_ranges(), vec![(-180.0, 180.0)]);

    // across the pole, same latitude, opposite meridian
    let beyond = GeoPoint::new(89.99, -170.0);
    assert!(anchor.distance_km(&beyond) < 5.0);
    assert!(area.contains(&beyond));

    let south = anchor.distance_km(&GeoPoint::new(area.lat_min, anchor.lon));
    assert!((south - 5.0).abs() < DISTANCE_TOLERANCE_KM);
}

#[test]
fn range_past_the_south_pole_clamps_to_it() {
    let anchor = GeoPoint::new(-89.5, 100.0);
    let area = calculate(anchor, 100.0).unwrap();
    assert_eq!(area.lat_min, -90.0);
    assert!(area.lat_max > anchor.lat);
    assert_eq!(area.lon_ranges(), vec![(-180.0, 180.0)]);

    // near the pole on a meridian the east edge alone would miss
    let near_pole = GeoPoint::new(-89.9, -80.0);
    assert!(anchor.distance_km(&near_pole) < 100.0);
    assert!(area.contains(&near_pole));
}

#[test]
fn anchor_on_the_pole_gets_a_box() {
    let area = calculate(GeoPoint::new(90.0, 0.0), 5.0).unwrap();
    assert_eq!(area.lat_max, 90.0);
    assert!(area.lat_min < 90.0);
    assert_eq!(area.lon_ranges(), vec![(-180.0, 180.0)]);
}

#[test]
fn large_range_expands_the_search_bound() {
    // 500 km needs well over the initial one-degree bound
    let anchor = GeoPoint::new(10.0, 20.0);
    let area = calculate(anchor, 500.0).unwrap();
    let (n, _, e, _) = edge_distances(anchor, &area);
    assert!((n - 500.0).abs() < DISTANCE_TOLERANCE_KM);
    assert!((e - 500.0).abs() < DISTANCE_TOLERANCE_KM);
    assert!(area.lat_max - anchor.lat > 4.0);
}

#[test]
fn antimeridian_box_splits_into_two_ranges() {
    let anchor = GeoPoint::new(0.0, 179.99);
    let area = calculate(anchor, 5.0).unwrap();
    assert!(area.lon_max > 180.0);

    let ranges = area.lon_ranges();
    assert_eq!(ranges.len(), 2);
    assert!(area.contains(&GeoPoint::new(0.0, -179.99)));
    assert!(area.contains(&GeoPoint::new(0.0, 179.98)));
    assert!(!area.contains(&GeoPoint::new(0.0, -170.0)));
}

#[test]
fn contains_respects_latitude_bounds() {
    let anchor = GeoPoint::new(40.0, -73.0);
    let area = calculate(anchor, 5.0).unwrap();
    assert!(area.contains(&anchor));
    assert!(!area.contains(&GeoPoint::new(41.0, -73.0)));
}

#[test]
fn display_lists_bounds() {
    let area = Area {
        lat_min: 1.0,
        lat_max: 2.0,
        lon_min: 3.0,
        lon_max: 4.0,
    };
    assert_eq!(area.to_string(), "Lat: [1, 2], Lon: [3, 4]");
}
