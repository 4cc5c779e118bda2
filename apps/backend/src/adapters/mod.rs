//! SeaORM adapters. Functions are generic over `ConnectionTrait` and return
//! `DbErr`; `repos::sea_store` maps results into domain types.

pub mod games_sea;
pub mod play_requests_sea;

use sea_orm::sea_query::Condition;
use sea_orm::ColumnTrait;

/// Rectangle filter: latitude between bounds and longitude in any of the
/// (already normalised) ranges.
pub(crate) fn area_condition<C: ColumnTrait>(
    lat_col: C,
    lon_col: C,
    lat_min: f64,
    lat_max: f64,
    lon_ranges: &[(f64, f64)],
) -> Condition {
    let lon_any = lon_ranges
        .iter()
        .fold(Condition::any(), |cond, (min, max)| {
            cond.add(lon_col.between(*min, *max))
        });
    Condition::all()
        .add(lat_col.between(lat_min, lat_max))
        .add(lon_any)
}
