use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoCoordinate;

/// ONLINE drivers are eligible for matching; ENGAGED drivers are bound to an
/// active ride. Only the lifecycle module writes this field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Online,
    Offline,
    Engaged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub location: Option<GeoCoordinate>,
    pub availability: Availability,
    pub price_per_km: Option<f64>,
    pub updated_at: DateTime<Utc>,
}
