use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::pricing::compute_price;
use crate::error::RideError;
use crate::geo::GeoCoordinate;
use crate::models::driver::{Availability, Driver};
use crate::models::event::RideEvent;
use crate::models::ride::{Ride, RideStatus};
use crate::state::AppState;

/// The mutating moves of the ride state machine. Creation is separate since
/// it has no prior state to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Accept,
    Start,
    Complete,
    Cancel,
}

impl Transition {
    pub fn target(self) -> RideStatus {
        match self {
            Transition::Accept => RideStatus::Accepted,
            Transition::Start => RideStatus::Started,
            Transition::Complete => RideStatus::Completed,
            Transition::Cancel => RideStatus::Cancelled,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::Start => "start",
            Transition::Complete => "complete",
            Transition::Cancel => "cancel",
        }
    }

    /// Cancel is open to either participant; everything else is the driver's.
    fn allows_client(self) -> bool {
        matches!(self, Transition::Cancel)
    }
}

/// Creates a ride in REQUESTED state with its price snapshotted from the
/// driver's current rate. Fails atomically: a pricing failure leaves no ride
/// behind.
pub fn create_ride(
    state: &AppState,
    client_id: Uuid,
    driver_id: Uuid,
    pickup: GeoCoordinate,
    dropoff: GeoCoordinate,
) -> Result<Ride, RideError> {
    if !state.clients.contains_key(&client_id) {
        return Err(RideError::NotFound(format!("client {client_id} not found")));
    }
    let driver = state
        .drivers
        .get(&driver_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| RideError::NotFound(format!("driver {driver_id} not found")))?;

    let price = compute_price(&driver, &pickup, &dropoff)?;

    let now = Utc::now();
    let ride = state.rides.create(Ride {
        id: Uuid::new_v4(),
        driver_id: Some(driver_id),
        client_id: Some(client_id),
        pickup,
        dropoff,
        status: RideStatus::Requested,
        price,
        created_at: now,
        updated_at: now,
        version: 0,
    })?;

    state.metrics.active_rides.inc();
    emit_event(state, &ride);
    info!(ride_id = %ride.id, driver_id = %driver_id, price, "ride requested");
    Ok(ride)
}

/// Validates and commits a transition against the persisted ride. A commit
/// that loses to a concurrent writer is retried once against the re-read
/// state before the conflict reaches the caller.
pub fn apply_transition(
    state: &AppState,
    ride_id: Uuid,
    caller_id: Uuid,
    transition: Transition,
) -> Result<Ride, RideError> {
    let result = match try_apply(state, ride_id, caller_id, transition) {
        Err(RideError::ConcurrencyConflict) => {
            debug!(ride_id = %ride_id, transition = transition.name(), "commit lost race, retrying");
            try_apply(state, ride_id, caller_id, transition)
        }
        other => other,
    };

    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .transitions_total
        .with_label_values(&[transition.name(), outcome])
        .inc();

    result
}

fn try_apply(
    state: &AppState,
    ride_id: Uuid,
    caller_id: Uuid,
    transition: Transition,
) -> Result<Ride, RideError> {
    let snapshot = state.rides.get(ride_id)?;
    authorize(state, &snapshot, caller_id, transition)?;

    let from = snapshot.status;
    let to = transition.target();
    if !from.can_transition_to(to) {
        return Err(RideError::InvalidTransition { from, to });
    }

    let updated = state.rides.transition(ride_id, from, to, |ride| {
        flip_driver_availability(state, ride, transition);
    })?;

    if updated.status.is_terminal() {
        state.metrics.active_rides.dec();
    }
    emit_event(state, &updated);
    info!(
        ride_id = %ride_id,
        caller_id = %caller_id,
        transition = transition.name(),
        status = ?updated.status,
        "ride transition committed"
    );
    Ok(updated)
}

/// Authorization runs on the fresh snapshot before any status check, so an
/// unauthorized caller sees Forbidden regardless of ride state.
fn authorize(
    state: &AppState,
    ride: &Ride,
    caller_id: Uuid,
    transition: Transition,
) -> Result<(), RideError> {
    if state.admins.contains(&caller_id) {
        return Ok(());
    }

    let is_driver = ride.driver_id == Some(caller_id);
    let is_client = ride.client_id == Some(caller_id);

    let allowed = is_driver || (transition.allows_client() && is_client);
    if allowed {
        Ok(())
    } else {
        Err(RideError::Forbidden(format!(
            "caller {caller_id} may not {} ride {}",
            transition.name(),
            ride.id
        )))
    }
}

/// Availability coupling, run inside the ride's commit critical section.
/// A missing driver reference (set-null after deletion) is a no-op.
fn flip_driver_availability(state: &AppState, ride: &Ride, transition: Transition) {
    let Some(driver_id) = ride.driver_id else {
        return;
    };
    let Some(mut driver) = state.drivers.get_mut(&driver_id) else {
        return;
    };

    match transition {
        Transition::Accept => driver.availability = Availability::Engaged,
        Transition::Complete => driver.availability = Availability::Online,
        Transition::Cancel => {
            if driver.availability == Availability::Engaged {
                driver.availability = Availability::Online;
            }
        }
        Transition::Start => return,
    }
    driver.updated_at = Utc::now();
}

/// Drivers go on and off duty through here so the lifecycle stays the only
/// writer of availability. ENGAGED is never set directly, and an engaged
/// driver cannot toggle until their active ride ends.
pub fn set_duty(
    state: &AppState,
    driver_id: Uuid,
    target: Availability,
) -> Result<Driver, RideError> {
    if target == Availability::Engaged {
        return Err(RideError::BadRequest(
            "availability ENGAGED is set by ride transitions only".to_string(),
        ));
    }

    let mut driver = state
        .drivers
        .get_mut(&driver_id)
        .ok_or_else(|| RideError::NotFound(format!("driver {driver_id} not found")))?;

    if driver.availability == Availability::Engaged {
        return Err(RideError::Conflict(format!(
            "driver {driver_id} is engaged on an active ride"
        )));
    }

    driver.availability = target;
    driver.updated_at = Utc::now();
    Ok(driver.clone())
}

/// Fire and forget. Send errors (no subscribers) are logged, never raised.
fn emit_event(state: &AppState, ride: &Ride) {
    if let Err(err) = state.ride_events_tx.send(RideEvent::from(ride)) {
        debug!(error = %err, ride_id = %ride.id, "ride event had no subscribers");
    }
}
