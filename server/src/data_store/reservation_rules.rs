//! Booking rules shared by all [RoomBookStore](super::RoomBookStore) implementations: validation
//! of new reservations, the time window overlap predicate and the reservation state machine.
//!
//! The functions in this module are pure. They don't access the database, such that the
//! PostgreSQL store and the mock store for unittests enforce exactly the same rules.

use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::{
    NewReservation, Reservation, ReservationReview, ReservationStatus, Room, RoomStatus,
    StatusChange,
};
use crate::data_store::{ReservationFilter, StoreError};
use chrono::{DateTime, Utc};

/// Check if the half-open time windows `[begin1, end1)` and `[begin2, end2)` overlap.
///
/// Windows which only touch each other (one ends exactly when the other begins) don't overlap.
pub fn windows_overlap(
    begin1: DateTime<Utc>,
    end1: DateTime<Utc>,
    begin2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    begin1 < end2 && begin2 < end1
}

/// Check that the time window is well-formed, i.e. not empty and not reversed.
pub fn validate_time_window(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), StoreError> {
    if begin >= end {
        return Err(StoreError::InvalidInputData(
            "startTime must be before endTime".to_owned(),
        ));
    }
    Ok(())
}

/// Check the required fields of a new reservation.
pub fn validate_new_reservation(reservation: &NewReservation) -> Result<(), StoreError> {
    if reservation.event_name.is_empty() {
        return Err(StoreError::InvalidInputData(
            "eventName must not be empty".to_owned(),
        ));
    }
    if reservation.participants <= 0 {
        return Err(StoreError::InvalidInputData(
            "participants must be a positive number".to_owned(),
        ));
    }
    validate_time_window(reservation.start_time, reservation.end_time)
}

/// Check that the authenticated user may create the reservation. Users may only book for
/// themselves.
pub fn check_booking_privilege(
    auth_token: &AuthToken,
    reservation: &NewReservation,
) -> Result<(), StoreError> {
    auth_token.check_reservation_privilege(
        reservation.user_id,
        Privilege::BookRooms,
        Privilege::BookRoomsForOthers,
    )
}

/// Check that the authenticated user may list the reservations selected by the `filter`.
///
/// Everybody may list their own reservations and the accepted reservations of all rooms (which
/// make up the room calendar). Anything else requires the [Privilege::ShowAllReservations].
pub fn check_listing_privilege(
    auth_token: &AuthToken,
    filter: &ReservationFilter,
) -> Result<(), StoreError> {
    if filter.user == Some(auth_token.user_id()) {
        return auth_token.check_privilege(Privilege::ShowOwnReservations);
    }
    if let Some(statuses) = &filter.statuses {
        if !statuses.is_empty() && statuses.iter().all(|s| *s == ReservationStatus::Accepted) {
            return auth_token.check_privilege(Privilege::ShowRooms);
        }
    }
    auth_token.check_privilege(Privilege::ShowAllReservations)
}

/// Check that the room can be booked at all, independently of the requested time.
pub fn check_room_bookable(room: &Room) -> Result<(), StoreError> {
    if room.status != RoomStatus::Active {
        return Err(StoreError::InvalidInputData(format!(
            "Room {} cannot be booked while its status is {}",
            room.code, room.status
        )));
    }
    Ok(())
}

/// Check a room's capacity bounds.
pub fn validate_capacity_bounds(min_capacity: i32, max_capacity: i32) -> Result<(), StoreError> {
    if min_capacity < 0 || min_capacity > max_capacity {
        return Err(StoreError::InvalidInputData(
            "Capacity bounds must satisfy 0 <= minCapacity <= maxCapacity".to_owned(),
        ));
    }
    Ok(())
}

/// The reservation state machine.
///
/// ```text
/// pending ──> accepted ──> cancelled
///    │                        ^
///    ├──> declined            │
///    └────────────────────────┘
/// ```
///
/// Declined and cancelled are final. Transitions to the current status are not allowed either.
pub fn is_transition_allowed(from: ReservationStatus, to: ReservationStatus) -> bool {
    use ReservationStatus::*;
    matches!(
        (from, to),
        (Pending, Accepted) | (Pending, Declined) | (Pending, Cancelled) | (Accepted, Cancelled)
    )
}

/// Check the requested status change of the `current` reservation and calculate the resulting
/// changeset.
///
/// - Accepting and declining requires the [Privilege::ReviewReservations]. These transitions
///   record the reviewer (given by the request or the authenticated user) and the review time.
///   Declining requires a non-empty rejection reason.
/// - Owners may cancel their own reservations; cancelling others' reservations requires the
///   [Privilege::CancelAnyReservation] and records the reviewer like a review.
///
/// Privileges are checked before the transition, such that unauthorized clients can't probe a
/// reservation's state.
pub fn review_for_transition(
    auth_token: &AuthToken,
    current: &Reservation,
    change: StatusChange,
    now: DateTime<Utc>,
) -> Result<ReservationReview, StoreError> {
    match change.status {
        ReservationStatus::Cancelled => auth_token.check_reservation_privilege(
            current.user_id,
            Privilege::CancelOwnReservations,
            Privilege::CancelAnyReservation,
        )?,
        _ => auth_token.check_privilege(Privilege::ReviewReservations)?,
    }
    if !is_transition_allowed(current.status, change.status) {
        return Err(StoreError::InvalidStatusTransition {
            from: current.status,
            to: change.status,
        });
    }

    let reviewer = change.reviewed_by.unwrap_or(auth_token.user_id());
    let rejection_reason = change
        .rejection_reason
        .map(|reason| reason.trim().to_owned())
        .filter(|reason| !reason.is_empty());

    let review = match change.status {
        ReservationStatus::Accepted => ReservationReview {
            status: ReservationStatus::Accepted,
            reviewed_by: Some(reviewer),
            reviewed_at: Some(now),
            rejection_reason: None,
            updated_at: now,
        },
        ReservationStatus::Declined => ReservationReview {
            status: ReservationStatus::Declined,
            reviewed_by: Some(reviewer),
            reviewed_at: Some(now),
            rejection_reason: Some(rejection_reason.ok_or_else(|| {
                StoreError::InvalidInputData(
                    "rejectionReason is required for declining a reservation".to_owned(),
                )
            })?),
            updated_at: now,
        },
        ReservationStatus::Cancelled if current.user_id == auth_token.user_id() => {
            ReservationReview {
                status: ReservationStatus::Cancelled,
                reviewed_by: current.reviewed_by,
                reviewed_at: current.reviewed_at,
                rejection_reason: current.rejection_reason.clone(),
                updated_at: now,
            }
        }
        ReservationStatus::Cancelled => ReservationReview {
            status: ReservationStatus::Cancelled,
            reviewed_by: Some(reviewer),
            reviewed_at: Some(now),
            rejection_reason: current.rejection_reason.clone(),
            updated_at: now,
        },
        // Unreachable: no transition leads to pending
        ReservationStatus::Pending => {
            return Err(StoreError::InvalidStatusTransition {
                from: current.status,
                to: change.status,
            })
        }
    };
    Ok(review)
}
