use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoCoordinate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RideStatus {
    Requested,
    Accepted,
    Started,
    Completed,
    Cancelled,
}

/// Statuses a participant still has an open ride in.
pub const ACTIVE_STATUSES: [RideStatus; 3] = [
    RideStatus::Requested,
    RideStatus::Accepted,
    RideStatus::Started,
];

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// The legal moves of the lifecycle state machine. Everything not listed
    /// here is rejected as an invalid transition.
    pub fn can_transition_to(self, to: RideStatus) -> bool {
        matches!(
            (self, to),
            (RideStatus::Requested, RideStatus::Accepted)
                | (RideStatus::Accepted, RideStatus::Started)
                | (RideStatus::Started, RideStatus::Completed)
                | (RideStatus::Requested, RideStatus::Cancelled)
                | (RideStatus::Accepted, RideStatus::Cancelled)
        )
    }
}

/// Driver and client references use set-null semantics: the ride survives
/// deletion of either profile and simply loses the link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub pickup: GeoCoordinate,
    pub dropoff: GeoCoordinate,
    pub status: RideStatus,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub version: u64,
}
