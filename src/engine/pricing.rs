use crate::error::RideError;
use crate::geo::{GeoCoordinate, haversine_km, round2};
use crate::models::driver::Driver;

/// Ride price at creation time: pickup-to-dropoff distance times the driver's
/// per-kilometer rate. The result is a snapshot; later rate changes never
/// touch an existing ride.
pub fn compute_price(
    driver: &Driver,
    pickup: &GeoCoordinate,
    dropoff: &GeoCoordinate,
) -> Result<f64, RideError> {
    let rate = driver.price_per_km.ok_or_else(|| {
        RideError::PriceUnavailable(format!("driver {} has no per-km rate", driver.id))
    })?;

    Ok(round2(haversine_km(pickup, dropoff) * rate))
}
