use chrono::Utc;
use dashmap::DashMap;
use dashmap::try_result::TryResult;
use uuid::Uuid;

use crate::error::RideError;
use crate::models::ride::{Ride, RideStatus};

/// Attempts to take a contended ride entry before reporting the store busy.
const LOCK_ATTEMPTS: usize = 8;

/// In-process ride repository. Every transition is a single atomic
/// read-check-write under the map's entry lock, with the persisted status
/// re-validated at commit time so a stale caller loses the race instead of
/// overwriting it.
pub struct RideStore {
    rides: DashMap<Uuid, Ride>,
}

impl RideStore {
    pub fn new() -> Self {
        Self {
            rides: DashMap::new(),
        }
    }

    pub fn create(&self, ride: Ride) -> Result<Ride, RideError> {
        if self.rides.contains_key(&ride.id) {
            return Err(RideError::Internal(format!(
                "ride {} already exists",
                ride.id
            )));
        }
        self.rides.insert(ride.id, ride.clone());
        Ok(ride)
    }

    /// Point-in-time snapshot of a ride.
    pub fn get(&self, id: Uuid) -> Result<Ride, RideError> {
        self.rides
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RideError::NotFound(format!("ride {id} not found")))
    }

    pub fn list_by_participant(&self, participant_id: Uuid, statuses: &[RideStatus]) -> Vec<Ride> {
        self.rides
            .iter()
            .filter(|entry| {
                let ride = entry.value();
                let is_participant = ride.client_id == Some(participant_id)
                    || ride.driver_id == Some(participant_id);
                is_participant && statuses.contains(&ride.status)
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rides.is_empty()
    }

    /// Commits `expected -> to` against the persisted record. The status is
    /// re-checked under the entry lock; a mismatch means another transition
    /// committed since the caller's read and surfaces as a retryable
    /// `ConcurrencyConflict`. `side_effect` (the driver availability flip)
    /// runs inside the same critical section, so ride and driver change as
    /// one logical unit or not at all.
    pub fn transition(
        &self,
        id: Uuid,
        expected: RideStatus,
        to: RideStatus,
        side_effect: impl FnOnce(&Ride),
    ) -> Result<Ride, RideError> {
        let mut entry = self.lock_entry(id)?;
        let ride = entry.value_mut();

        if ride.status != expected {
            return Err(RideError::ConcurrencyConflict);
        }

        side_effect(ride);
        ride.status = to;
        ride.updated_at = Utc::now();
        ride.version += 1;
        Ok(ride.clone())
    }

    fn lock_entry(
        &self,
        id: Uuid,
    ) -> Result<dashmap::mapref::one::RefMut<'_, Uuid, Ride>, RideError> {
        for _ in 0..LOCK_ATTEMPTS {
            match self.rides.try_get_mut(&id) {
                TryResult::Present(entry) => return Ok(entry),
                TryResult::Absent => {
                    return Err(RideError::NotFound(format!("ride {id} not found")));
                }
                TryResult::Locked => std::thread::yield_now(),
            }
        }
        Err(RideError::StoreUnavailable(format!(
            "ride {id} is locked by another transition"
        )))
    }
}

impl Default for RideStore {
    fn default() -> Self {
        Self::new()
    }
}
