use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle;
use crate::error::RideError;
use crate::geo::GeoCoordinate;
use crate::models::driver::{Availability, Driver};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/location", patch(update_driver_location))
        .route("/drivers/:id/duty", patch(update_driver_duty))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub location: Option<GeoCoordinate>,
    pub price_per_km: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoCoordinate,
}

#[derive(Deserialize)]
pub struct UpdateDutyRequest {
    pub availability: Availability,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, RideError> {
    if payload.name.trim().is_empty() {
        return Err(RideError::BadRequest("name cannot be empty".to_string()));
    }

    let location = payload.location.map(GeoCoordinate::validated).transpose()?;

    if let Some(rate) = payload.price_per_km {
        if !rate.is_finite() || rate < 0.0 {
            return Err(RideError::BadRequest(
                "price_per_km must be a non-negative number".to_string(),
            ));
        }
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        name: payload.name,
        location,
        availability: Availability::Offline,
        price_per_km: payload.price_per_km,
        updated_at: Utc::now(),
    };

    state.drivers.insert(driver.id, driver.clone());
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let drivers = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(drivers)
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, RideError> {
    let location = payload.location.validated()?;

    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| RideError::NotFound(format!("driver {id} not found")))?;

    driver.location = Some(location);
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn update_driver_duty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDutyRequest>,
) -> Result<Json<Driver>, RideError> {
    let driver = lifecycle::set_duty(&state, id, payload.availability)?;
    Ok(Json(driver))
}
