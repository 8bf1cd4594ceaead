//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [RoomBookStore] trait. This object can be shared between threads in a
//! global application state and be used to create [RoomBookStoreFacade] instances for interaction
//! with the database. These provide a CRUD-like interface, using the data models from the [models]
//! module.
//!
//! The primary implementation of [RoomBookStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [RoomBookStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! There is also a mock implementation for unittests, which shares the booking rules from
//! [reservation_rules] with the PostgreSQL implementation.

use crate::cli_error::CliError;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::setup;
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Display, Formatter};

pub mod auth_token;
pub mod models;
mod postgres;
pub mod reservation_rules;
mod schema;

/// Get a [RoomBookStore] instance, according to the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PosgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl RoomBookStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| CliError::UnexpectedStoreError(err.to_string()))
}

pub type RoomId = uuid::Uuid;
pub type RoomTypeId = uuid::Uuid;
pub type CapacityId = uuid::Uuid;
pub type LocationId = uuid::Uuid;
pub type FacilityId = uuid::Uuid;
pub type ReservationId = uuid::Uuid;
pub type UserId = uuid::Uuid;

pub trait RoomBookStoreFacade {
    fn get_rooms(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::FullRoom>, StoreError>;
    fn get_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
    ) -> Result<models::FullRoom, StoreError>;
    /// Create a new room.
    ///
    /// The referenced room type, capacity, location and facilities must exist. Otherwise,
    /// `StoreError::InvalidInputData` is returned. A room with the same `code` must not exist
    /// (`StoreError::ConflictEntityExists`).
    fn create_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::FullNewRoom,
    ) -> Result<models::FullRoom, StoreError>;
    fn update_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::FullNewRoom,
    ) -> Result<models::FullRoom, StoreError>;
    /// Delete a room.
    ///
    /// # return value
    /// - `Ok(())` if the room has been deleted
    /// - `Err(StoreError::EntityInUse)` if any reservation references the room. Reservations are
    ///   never deleted along with their room.
    /// - `Err(StoreError::NotExisting)` if there is no such room
    fn delete_room(&mut self, auth_token: &AuthToken, room_id: RoomId) -> Result<(), StoreError>;

    fn get_room_types(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomType>, StoreError>;
    fn get_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type_id: RoomTypeId,
    ) -> Result<models::RoomType, StoreError>;
    fn create_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type: models::NewRoomType,
    ) -> Result<models::RoomType, StoreError>;
    fn update_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type: models::NewRoomType,
    ) -> Result<models::RoomType, StoreError>;
    /// Delete a room type. Fails with `StoreError::EntityInUse` if any room has this type.
    fn delete_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type_id: RoomTypeId,
    ) -> Result<(), StoreError>;

    fn get_capacities(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomCapacity>, StoreError>;
    fn get_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity_id: CapacityId,
    ) -> Result<models::RoomCapacity, StoreError>;
    fn create_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity: models::NewRoomCapacity,
    ) -> Result<models::RoomCapacity, StoreError>;
    fn update_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity: models::NewRoomCapacity,
    ) -> Result<models::RoomCapacity, StoreError>;
    /// Delete a capacity class. Fails with `StoreError::EntityInUse` if any room uses it.
    fn delete_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity_id: CapacityId,
    ) -> Result<(), StoreError>;

    fn get_locations(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomLocation>, StoreError>;
    fn get_location(
        &mut self,
        auth_token: &AuthToken,
        location_id: LocationId,
    ) -> Result<models::RoomLocation, StoreError>;
    fn create_location(
        &mut self,
        auth_token: &AuthToken,
        location: models::NewRoomLocation,
    ) -> Result<models::RoomLocation, StoreError>;
    fn update_location(
        &mut self,
        auth_token: &AuthToken,
        location: models::NewRoomLocation,
    ) -> Result<models::RoomLocation, StoreError>;
    /// Delete a location. Fails with `StoreError::EntityInUse` if any room is located there.
    fn delete_location(
        &mut self,
        auth_token: &AuthToken,
        location_id: LocationId,
    ) -> Result<(), StoreError>;

    fn get_facilities(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::Facility>, StoreError>;
    fn get_facility(
        &mut self,
        auth_token: &AuthToken,
        facility_id: FacilityId,
    ) -> Result<models::Facility, StoreError>;
    fn create_facility(
        &mut self,
        auth_token: &AuthToken,
        facility: models::NewFacility,
    ) -> Result<models::Facility, StoreError>;
    fn update_facility(
        &mut self,
        auth_token: &AuthToken,
        facility: models::NewFacility,
    ) -> Result<models::Facility, StoreError>;
    /// Delete a facility. Fails with `StoreError::EntityInUse` if any room is equipped with it.
    fn delete_facility(
        &mut self,
        auth_token: &AuthToken,
        facility_id: FacilityId,
    ) -> Result<(), StoreError>;

    /// Get all reservations of the room that block the time window `[begin, end)`, i.e. all
    /// pending or accepted reservations overlapping with it, ordered by start time.
    ///
    /// The reservation `exclude` is never part of the result, which allows checking an existing
    /// reservation against all the others.
    ///
    /// Fails with `StoreError::NotExisting` if the room does not exist.
    fn check_availability(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<models::Reservation>, StoreError>;

    /// Create a new reservation in pending state.
    ///
    /// With [BookingConflictMode::Advisory], overlapping reservations don't prevent the creation.
    /// With [BookingConflictMode::Strict], the availability check and the insertion happen in a
    /// single serializable transaction and overlaps are rejected with
    /// `StoreError::BookingConflict`.
    fn create_reservation(
        &mut self,
        auth_token: &AuthToken,
        reservation: models::NewReservation,
        mode: BookingConflictMode,
    ) -> Result<models::Reservation, StoreError>;

    fn get_reservation(
        &mut self,
        auth_token: &AuthToken,
        reservation_id: ReservationId,
    ) -> Result<models::Reservation, StoreError>;

    /// Get a filtered list of reservations in the given order.
    ///
    /// If `page` is None, all matching reservations are returned in a single page.
    fn get_reservations_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: ReservationFilter,
        order: ReservationOrder,
        page: Option<PageRequest>,
    ) -> Result<Paginated<models::Reservation>, StoreError>;

    /// Transition the reservation to a new status, following the rules of
    /// [reservation_rules::review_for_transition].
    fn update_reservation_status(
        &mut self,
        auth_token: &AuthToken,
        reservation_id: ReservationId,
        update: models::StatusChange,
    ) -> Result<models::Reservation, StoreError>;

    /// Load the view preferences of the authenticated user. Returns the default preferences if
    /// the user has not saved any yet.
    fn get_user_preferences(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<roombook_api_types::UserPreferences, StoreError>;
    fn save_user_preferences(
        &mut self,
        auth_token: &AuthToken,
        preferences: roombook_api_types::UserPreferences,
    ) -> Result<(), StoreError>;
}

pub trait RoomBookStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn RoomBookStoreFacade + 'a>, StoreError>;
}

/// Whether overlapping reservations are rejected at creation time or only reported by the
/// availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingConflictMode {
    #[default]
    Advisory,
    Strict,
}

/// Selection of a page of a listing. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub const MAX_PAGE_SIZE: i64 = 100;

    pub fn new(page: i64, page_size: i64) -> Result<Self, StoreError> {
        if page < 1 {
            return Err(StoreError::InvalidInputData(
                "page must be at least 1".to_owned(),
            ));
        }
        if !(1..=Self::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(StoreError::InvalidInputData(format!(
                "pageSize must be between 1 and {}",
                Self::MAX_PAGE_SIZE
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Number of items before this page. Saturates for huge page numbers, which are past the
    /// end of any listing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Cut the page out of the complete list of items
    pub fn apply<T>(&self, items: Vec<T>) -> Paginated<T> {
        let total_count = items.len() as i64;
        Paginated {
            items: items
                .into_iter()
                .skip(usize::try_from(self.offset()).unwrap_or(usize::MAX))
                .take(self.page_size as usize)
                .collect(),
            total_count,
        }
    }
}

/// One page of a listing, together with the total number of items over all pages
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
        }
    }

    pub fn into_api(self, page: PageRequest) -> roombook_api_types::Page<T> {
        roombook_api_types::Page {
            data: self.items,
            pagination: roombook_api_types::Pagination::new(
                page.page,
                page.page_size,
                self.total_count,
            ),
        }
    }
}

/// Sort orders for listing reservations via RoomBookStoreFacade::get_reservations_filtered()
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationOrder {
    /// Soonest first, e.g. for the review queue and the calendar
    StartTimeAscending,
    /// Most recently submitted first
    CreatedDescending,
}

/// Filter options for retrieving reservations from the store via
/// RoomBookStoreFacade::get_reservations_filtered()
///
/// Can be constructed through the ReservationFilterBuilder
#[derive(Default, Debug, Clone)]
pub struct ReservationFilter {
    /// Filter for reservations that end after the given point in time (this includes
    /// reservations that span over this point in time)
    pub after: Option<DateTime<Utc>>,
    /// Filter for reservations that begin before the given point in time (this includes
    /// reservations that span over this point in time)
    pub before: Option<DateTime<Utc>>,
    pub room: Option<RoomId>,
    pub user: Option<UserId>,
    /// Filter for reservations in any of the given states
    pub statuses: Option<Vec<models::ReservationStatus>>,
    /// Exclude the reservation with this id
    pub exclude: Option<ReservationId>,
}

impl ReservationFilter {
    /// Checks if a given reservation matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual reservations in software.
    pub fn matches(&self, reservation: &models::Reservation) -> bool {
        match (self.after, self.before) {
            (Some(after), Some(before)) => {
                if !reservation_rules::windows_overlap(
                    after,
                    before,
                    reservation.start_time,
                    reservation.end_time,
                ) {
                    return false;
                }
            }
            (Some(after), None) if after >= reservation.end_time => return false,
            (None, Some(before)) if before <= reservation.start_time => return false,
            _ => {}
        }
        if let Some(room) = self.room {
            if room != reservation.room_id {
                return false;
            }
        }
        if let Some(user) = self.user {
            if user != reservation.user_id {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&reservation.status) {
                return false;
            }
        }
        if self.exclude == Some(reservation.id) {
            return false;
        }
        true
    }

    /// Filter for all reservations that block the room within `[begin, end)`
    pub fn conflicting_with(
        room_id: RoomId,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Self {
        let mut builder = ReservationFilterBuilder::new();
        builder
            .in_room(room_id)
            .overlapping(begin, end)
            .status_is_one_of(models::ReservationStatus::BLOCKING.to_vec());
        if let Some(exclude) = exclude {
            builder.excluding(exclude);
        }
        builder.build()
    }
}

/// Builder for constructing ReservationFilter objects
pub struct ReservationFilterBuilder {
    result: ReservationFilter,
}

impl ReservationFilterBuilder {
    pub fn new() -> Self {
        Self {
            result: ReservationFilter::default(),
        }
    }

    /// Add filters to only include reservations overlapping with the half-open time window
    /// `[begin, end)`. Reservations ending exactly at `begin` or starting exactly at `end` are not
    /// included.
    pub fn overlapping(&mut self, begin: DateTime<Utc>, end: DateTime<Utc>) -> &mut Self {
        self.result.after = Some(begin);
        self.result.before = Some(end);
        self
    }

    /// Add a filter to only include reservations ending after the given point in time
    pub fn ending_after(&mut self, after: DateTime<Utc>) -> &mut Self {
        self.result.after = Some(after);
        self
    }

    pub fn in_room(&mut self, room_id: RoomId) -> &mut Self {
        self.result.room = Some(room_id);
        self
    }

    pub fn of_user(&mut self, user_id: UserId) -> &mut Self {
        self.result.user = Some(user_id);
        self
    }

    pub fn status_is_one_of(&mut self, statuses: Vec<models::ReservationStatus>) -> &mut Self {
        self.result.statuses = Some(statuses);
        self
    }

    pub fn excluding(&mut self, reservation_id: ReservationId) -> &mut Self {
        self.result.exclude = Some(reservation_id);
        self
    }

    /// Create the ReservationFilter object
    pub fn build(self) -> ReservationFilter {
        self.result
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists (e.g. the room code is taken)
    ConflictEntityExists,
    /// The entity cannot be deleted, because other entities reference it
    EntityInUse { referenced_by: &'static str },
    /// The reservation has not been created, because it overlaps with the given blocking
    /// reservations of the same room
    BookingConflict {
        conflicting_reservations: Vec<ReservationId>,
    },
    /// The requested status change is not allowed from the reservation's current status
    InvalidStatusTransition {
        from: models::ReservationStatus,
        to: models::ReservationStatus,
    },
    /// The client is not authorized for this action. It would need to authenticate for an access
    /// role qualifying for the `required_privilege`.
    PermissionDenied { required_privilege: Privilege },
    /// The provided data is invalid, i.e. it does not match the expected ranges or violates a
    /// SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | diesel::result::DatabaseErrorKind::CheckViolation,
                info,
            ) => Self::InvalidInputData(
                info.constraint_name()
                    .and_then(postgres::description_for_postgres_constraint)
                    .map(|d| d.to_owned())
                    .unwrap_or_else(|| info.message().to_owned()),
            ),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::EntityInUse { referenced_by } => {
                write!(f, "Database record is still referenced by {}.", referenced_by)
            }
            Self::BookingConflict { conflicting_reservations } => write!(
                f,
                "The requested time overlaps with {} existing reservation(s) of the room.",
                conflicting_reservations.len()
            ),
            Self::InvalidStatusTransition { from, to } => write!(
                f,
                "A reservation cannot change from {} to {}.",
                from, to
            ),
            Self::PermissionDenied { required_privilege } => {
                write!(f, "Client is not authorized to perform this action. {:?} privilege required.", required_privilege)
            }
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
        }
    }
}

impl std::error::Error for StoreError {}

pub struct EnumMemberNotExistingError {
    pub member_value: String,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for {} enum",
            self.member_value, self.enum_name
        )
    }
}

impl Debug for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
