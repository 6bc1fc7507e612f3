use std::collections::HashSet;
use std::env;

use uuid::Uuid;

use crate::error::RideError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Default number of drivers returned by a nearby-driver query.
    pub match_limit: usize,
    /// Default search radius for nearby-driver queries, in kilometers.
    pub match_max_distance_km: f64,
    /// Callers authorized for any ride transition.
    pub admin_ids: HashSet<Uuid>,
}

impl Config {
    pub fn from_env() -> Result<Self, RideError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            match_limit: parse_or_default("MATCH_LIMIT", 7)?,
            match_max_distance_km: parse_or_default("MATCH_MAX_DISTANCE_KM", 50.0)?,
            admin_ids: parse_admin_ids()?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, RideError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| RideError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn parse_admin_ids() -> Result<HashSet<Uuid>, RideError> {
    let Ok(raw) = env::var("ADMIN_IDS") else {
        return Ok(HashSet::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Uuid>()
                .map_err(|err| RideError::Internal(format!("invalid ADMIN_IDS entry {part}: {err}")))
        })
        .collect()
}
