use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::client::Client;
use crate::models::driver::Driver;
use crate::models::event::RideEvent;
use crate::observability::metrics::Metrics;
use crate::store::RideStore;

pub struct AppState {
    pub drivers: DashMap<Uuid, Driver>,
    pub clients: DashMap<Uuid, Client>,
    pub rides: RideStore,
    pub ride_events_tx: broadcast::Sender<RideEvent>,
    pub admins: HashSet<Uuid>,
    /// Defaults for nearby-driver queries that omit limit or radius.
    pub match_limit: usize,
    pub match_max_distance_km: f64,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        event_buffer_size: usize,
        match_limit: usize,
        match_max_distance_km: f64,
        admins: HashSet<Uuid>,
    ) -> Self {
        let (ride_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            drivers: DashMap::new(),
            clients: DashMap::new(),
            rides: RideStore::new(),
            ride_events_tx,
            admins,
            match_limit,
            match_max_distance_km,
            metrics: Metrics::new(),
        }
    }
}
