use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::{GeoCoordinate, haversine_km, round2};
use crate::models::driver::{Availability, Driver};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverMatch {
    pub driver: Driver,
    pub distance_km: f64,
}

/// Ranks ONLINE, located drivers by great-circle distance from `origin`.
///
/// An absent origin means "no matches", not an error. Ties keep the input
/// order (the sort is stable), so results are deterministic for equal
/// distances. Filtering and ordering use full-precision distances; the
/// `distance_km` on each returned match is rounded to two decimals.
pub fn find_nearby(
    origin: Option<&GeoCoordinate>,
    exclude: Option<Uuid>,
    candidates: &[Driver],
    limit: usize,
    max_distance_km: f64,
) -> Vec<DriverMatch> {
    let Some(origin) = origin else {
        return Vec::new();
    };

    let mut ranked: Vec<(&Driver, f64)> = candidates
        .iter()
        .filter(|driver| driver.availability == Availability::Online)
        .filter(|driver| Some(driver.id) != exclude)
        .filter_map(|driver| {
            let location = driver.location.as_ref()?;
            Some((driver, haversine_km(origin, location)))
        })
        .filter(|(_, distance)| *distance <= max_distance_km)
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(driver, distance)| DriverMatch {
            driver: driver.clone(),
            distance_km: round2(distance),
        })
        .collect()
}
