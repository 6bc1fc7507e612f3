use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle::{self, Transition};
use crate::error::RideError;
use crate::geo::GeoCoordinate;
use crate::models::ride::{ACTIVE_STATUSES, Ride};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rides", post(create_ride))
        .route("/rides/:id", get(get_ride))
        .route("/rides/:id/accept", post(accept_ride))
        .route("/rides/:id/start", post(start_ride))
        .route("/rides/:id/complete", post(complete_ride))
        .route("/rides/:id/cancel", post(cancel_ride))
        .route("/participants/:id/rides", get(list_active_rides))
}

#[derive(Deserialize)]
pub struct CreateRideRequest {
    pub client_id: Uuid,
    pub driver_id: Uuid,
    pub pickup: GeoCoordinate,
    pub dropoff: GeoCoordinate,
}

/// Caller identity for a transition. Token-based auth lives outside this
/// service; here the resolved caller id is passed explicitly.
#[derive(Deserialize)]
pub struct CallerRequest {
    pub caller_id: Uuid,
}

async fn create_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRideRequest>,
) -> Result<Json<Ride>, RideError> {
    let pickup = payload.pickup.validated()?;
    let dropoff = payload.dropoff.validated()?;

    let ride = lifecycle::create_ride(&state, payload.client_id, payload.driver_id, pickup, dropoff)?;
    Ok(Json(ride))
}

async fn get_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, RideError> {
    Ok(Json(state.rides.get(id)?))
}

async fn list_active_rides(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Ride>> {
    Json(state.rides.list_by_participant(id, &ACTIVE_STATUSES))
}

async fn accept_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallerRequest>,
) -> Result<Json<Ride>, RideError> {
    apply(&state, id, payload.caller_id, Transition::Accept)
}

async fn start_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallerRequest>,
) -> Result<Json<Ride>, RideError> {
    apply(&state, id, payload.caller_id, Transition::Start)
}

async fn complete_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallerRequest>,
) -> Result<Json<Ride>, RideError> {
    apply(&state, id, payload.caller_id, Transition::Complete)
}

async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CallerRequest>,
) -> Result<Json<Ride>, RideError> {
    apply(&state, id, payload.caller_id, Transition::Cancel)
}

fn apply(
    state: &AppState,
    ride_id: Uuid,
    caller_id: Uuid,
    transition: Transition,
) -> Result<Json<Ride>, RideError> {
    let ride = lifecycle::apply_transition(state, ride_id, caller_id, transition)?;
    Ok(Json(ride))
}
