use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ride::{Ride, RideStatus};

/// Fire-and-forget "ride status changed" notification, broadcast to whoever
/// is listening. Delivery is best effort; nothing in the lifecycle waits on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideEvent {
    pub ride_id: Uuid,
    pub status: RideStatus,
    pub driver_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub price: f64,
    pub at: DateTime<Utc>,
}

impl From<&Ride> for RideEvent {
    fn from(ride: &Ride) -> Self {
        Self {
            ride_id: ride.id,
            status: ride.status,
            driver_id: ride.driver_id,
            client_id: ride.client_id,
            price: ride.price,
            at: ride.updated_at,
        }
    }
}
