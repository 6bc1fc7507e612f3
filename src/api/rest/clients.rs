use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::matching::{DriverMatch, find_nearby};
use crate::error::RideError;
use crate::geo::GeoCoordinate;
use crate::models::client::Client;
use crate::models::driver::Driver;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", post(create_client))
        .route("/clients/:id/location", patch(update_client_location))
        .route("/clients/:id/nearby-drivers", get(nearby_drivers))
}

#[derive(Deserialize)]
pub struct CreateClientRequest {
    pub name: String,
    pub location: Option<GeoCoordinate>,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub location: GeoCoordinate,
}

#[derive(Deserialize)]
pub struct MatchParams {
    pub limit: Option<usize>,
    pub max_distance_km: Option<f64>,
}

async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateClientRequest>,
) -> Result<Json<Client>, RideError> {
    if payload.name.trim().is_empty() {
        return Err(RideError::BadRequest("name cannot be empty".to_string()));
    }

    let location = payload.location.map(GeoCoordinate::validated).transpose()?;

    let client = Client {
        id: Uuid::new_v4(),
        name: payload.name,
        location,
        updated_at: Utc::now(),
    };

    state.clients.insert(client.id, client.clone());
    Ok(Json(client))
}

async fn update_client_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Client>, RideError> {
    let location = payload.location.validated()?;

    let mut client = state
        .clients
        .get_mut(&id)
        .ok_or_else(|| RideError::NotFound(format!("client {id} not found")))?;

    client.location = Some(location);
    client.updated_at = Utc::now();

    Ok(Json(client.clone()))
}

/// Ranked ONLINE drivers around the client's last known location. A client
/// with no location gets an empty list, not an error.
async fn nearby_drivers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<MatchParams>,
) -> Result<Json<Vec<DriverMatch>>, RideError> {
    let timer = state.metrics.match_latency_seconds.start_timer();

    let Some(client) = state.clients.get(&id).map(|entry| entry.value().clone()) else {
        state
            .metrics
            .match_requests_total
            .with_label_values(&["error"])
            .inc();
        return Err(RideError::NotFound(format!("client {id} not found")));
    };

    // Point-in-time snapshot; staleness is re-validated at ride creation.
    let candidates: Vec<Driver> = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    let limit = params.limit.unwrap_or(state.match_limit);
    let max_distance_km = params.max_distance_km.unwrap_or(state.match_max_distance_km);

    let matches = find_nearby(
        client.location.as_ref(),
        Some(client.id),
        &candidates,
        limit,
        max_distance_km,
    );

    timer.observe_duration();
    state
        .metrics
        .match_requests_total
        .with_label_values(&["success"])
        .inc();

    Ok(Json(matches))
}
