use crate::data_store::{
    CapacityId, EnumMemberNotExistingError, FacilityId, LocationId, ReservationId, RoomId,
    RoomTypeId, UserId,
};
use chrono::{DateTime, Utc};
use diesel::deserialize::FromSql;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::query_builder::bind_collector::RawBytesBindCollector;
use diesel::serialize::ToSql;
use diesel::{AsExpression, FromSqlRow};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::rooms)]
pub struct Room {
    pub id: RoomId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub status: RoomStatus,
    pub room_type_id: RoomTypeId,
    pub capacity_id: CapacityId,
    pub location_id: LocationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct FullRoom {
    pub room: Room,
    pub facility_ids: Vec<FacilityId>,
}

impl From<FullRoom> for roombook_api_types::Room {
    fn from(value: FullRoom) -> Self {
        Self {
            id: value.room.id,
            code: value.room.code,
            name: value.room.name,
            description: value.room.description,
            status: value.room.status.into(),
            room_type_id: value.room.room_type_id,
            capacity_id: value.room.capacity_id,
            location_id: value.room.location_id,
            facility_ids: value.facility_ids,
            created_at: value.room.created_at,
            updated_at: value.room.updated_at,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::rooms)]
pub struct NewRoom {
    pub id: RoomId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub status: RoomStatus,
    pub room_type_id: RoomTypeId,
    pub capacity_id: CapacityId,
    pub location_id: LocationId,
}

#[derive(Clone, Debug)]
pub struct FullNewRoom {
    pub room: NewRoom,
    pub facility_ids: Vec<FacilityId>,
}

impl FullNewRoom {
    pub fn from_api(room: roombook_api_types::RoomData, room_id: RoomId) -> Self {
        let mut facility_ids = room.facility_ids;
        facility_ids.sort();
        facility_ids.dedup();
        Self {
            room: NewRoom {
                id: room_id,
                code: room.code.trim().to_owned(),
                name: room.name,
                description: room.description,
                status: room.status.into(),
                room_type_id: room.room_type_id,
                capacity_id: room.capacity_id,
                location_id: room.location_id,
            },
            facility_ids,
        }
    }
}

// Introduce type for Room-Facility-association, to simplify grouped retrieval of facility_ids of a
// Room using Diesel's .grouped_by() method.
#[derive(Queryable, Associations, Identifiable, Selectable, Insertable)]
#[diesel(table_name=super::schema::room_facilities)]
#[diesel(primary_key(room_id, facility_id))]
#[diesel(belongs_to(Room))]
pub struct RoomFacilityMapping {
    pub room_id: RoomId,
    pub facility_id: FacilityId,
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::room_types)]
pub struct RoomType {
    pub id: RoomTypeId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomType> for roombook_api_types::RoomType {
    fn from(value: RoomType) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::room_types)]
pub struct NewRoomType {
    pub id: RoomTypeId,
    pub name: String,
    pub description: String,
}

impl NewRoomType {
    pub fn from_api(room_type: roombook_api_types::RoomTypeData, room_type_id: RoomTypeId) -> Self {
        Self {
            id: room_type_id,
            name: room_type.name,
            description: room_type.description,
        }
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::room_capacities)]
pub struct RoomCapacity {
    pub id: CapacityId,
    pub name: String,
    pub min_capacity: i32,
    pub max_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomCapacity> for roombook_api_types::RoomCapacity {
    fn from(value: RoomCapacity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            min_capacity: value.min_capacity,
            max_capacity: value.max_capacity,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::room_capacities)]
pub struct NewRoomCapacity {
    pub id: CapacityId,
    pub name: String,
    pub min_capacity: i32,
    pub max_capacity: i32,
}

impl NewRoomCapacity {
    pub fn from_api(capacity: roombook_api_types::RoomCapacityData, capacity_id: CapacityId) -> Self {
        Self {
            id: capacity_id,
            name: capacity.name,
            min_capacity: capacity.min_capacity,
            max_capacity: capacity.max_capacity,
        }
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::room_locations)]
pub struct RoomLocation {
    pub id: LocationId,
    pub building: String,
    pub floor: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RoomLocation> for roombook_api_types::RoomLocation {
    fn from(value: RoomLocation) -> Self {
        Self {
            id: value.id,
            building: value.building,
            floor: value.floor,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::room_locations)]
pub struct NewRoomLocation {
    pub id: LocationId,
    pub building: String,
    pub floor: String,
    pub description: String,
}

impl NewRoomLocation {
    pub fn from_api(location: roombook_api_types::RoomLocationData, location_id: LocationId) -> Self {
        Self {
            id: location_id,
            building: location.building,
            floor: location.floor,
            description: location.description,
        }
    }
}

#[derive(Clone, Debug, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::facilities)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Facility> for roombook_api_types::Facility {
    fn from(value: Facility) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::facilities)]
pub struct NewFacility {
    pub id: FacilityId,
    pub name: String,
    pub description: String,
}

impl NewFacility {
    pub fn from_api(facility: roombook_api_types::FacilityData, facility_id: FacilityId) -> Self {
        Self {
            id: facility_id,
            name: facility.name,
            description: facility.description,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Identifiable, Selectable)]
#[diesel(table_name=super::schema::reservations)]
pub struct Reservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub event_name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants: i32,
    pub notes: String,
    pub status: ReservationStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for roombook_api_types::Reservation {
    fn from(value: Reservation) -> Self {
        Self {
            id: value.id,
            room_id: value.room_id,
            user_id: value.user_id,
            event_name: value.event_name,
            description: value.description,
            start_time: value.start_time,
            end_time: value.end_time,
            participants: value.participants,
            notes: value.notes,
            status: value.status.into(),
            reviewed_by: value.reviewed_by,
            reviewed_at: value.reviewed_at,
            rejection_reason: value.rejection_reason,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// A reservation as submitted by a user. It is always stored with status
/// [ReservationStatus::Pending].
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::reservations)]
pub struct NewReservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub event_name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participants: i32,
    pub notes: String,
    pub status: ReservationStatus,
}

impl NewReservation {
    pub fn from_api(
        reservation: roombook_api_types::NewReservation,
        reservation_id: ReservationId,
        user_id: UserId,
    ) -> Self {
        Self {
            id: reservation_id,
            room_id: reservation.room_id,
            user_id,
            event_name: reservation.event_name.trim().to_owned(),
            description: reservation.description,
            start_time: reservation.start_time,
            end_time: reservation.end_time,
            participants: reservation.participants,
            notes: reservation.notes,
            status: ReservationStatus::Pending,
        }
    }
}

/// A requested status change of a reservation, before checking it against the reservation's
/// current state
#[derive(Clone, Debug)]
pub struct StatusChange {
    pub status: ReservationStatus,
    pub reviewed_by: Option<UserId>,
    pub rejection_reason: Option<String>,
}

impl From<roombook_api_types::ReservationStatusUpdate> for StatusChange {
    fn from(value: roombook_api_types::ReservationStatusUpdate) -> Self {
        Self {
            status: value.status.into(),
            reviewed_by: value.reviewed_by,
            rejection_reason: value.rejection_reason,
        }
    }
}

/// The changeset for a validated status change of a reservation
#[derive(Clone, Debug, AsChangeset)]
#[diesel(table_name=super::schema::reservations)]
#[diesel(treat_none_as_null = true)]
pub struct ReservationReview {
    pub status: ReservationStatus,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ReservationReview {
    pub fn apply_to(&self, reservation: &mut Reservation) {
        reservation.status = self.status;
        reservation.reviewed_by = self.reviewed_by;
        reservation.reviewed_at = self.reviewed_at;
        reservation.rejection_reason = self.rejection_reason.clone();
        reservation.updated_at = self.updated_at;
    }
}

#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum RoomStatus {
    Active,
    Maintenance,
    Renovation,
    Inactive,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Active => "active",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::Renovation => "renovation",
            RoomStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for RoomStatus {
    type Err = EnumMemberNotExistingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(RoomStatus::Active),
            "maintenance" => Ok(RoomStatus::Maintenance),
            "renovation" => Ok(RoomStatus::Renovation),
            "inactive" => Ok(RoomStatus::Inactive),
            _ => Err(EnumMemberNotExistingError {
                member_value: value.to_owned(),
                enum_name: "RoomStatus",
            }),
        }
    }
}

impl Display for RoomStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RoomStatus> for roombook_api_types::RoomStatus {
    fn from(value: RoomStatus) -> Self {
        match value {
            RoomStatus::Active => Self::Active,
            RoomStatus::Maintenance => Self::Maintenance,
            RoomStatus::Renovation => Self::Renovation,
            RoomStatus::Inactive => Self::Inactive,
        }
    }
}

impl From<roombook_api_types::RoomStatus> for RoomStatus {
    fn from(value: roombook_api_types::RoomStatus) -> Self {
        match value {
            roombook_api_types::RoomStatus::Active => Self::Active,
            roombook_api_types::RoomStatus::Maintenance => Self::Maintenance,
            roombook_api_types::RoomStatus::Renovation => Self::Renovation,
            roombook_api_types::RoomStatus::Inactive => Self::Inactive,
        }
    }
}

impl ToSql<diesel::sql_types::Text, Pg> for RoomStatus {
    fn to_sql<'b>(&'b self, out: &mut diesel::serialize::Output<'b, '_, Pg>) -> diesel::serialize::Result {
        <str as ToSql<diesel::sql_types::Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<diesel::sql_types::Text, Pg> for RoomStatus {
    fn from_sql(bytes: PgValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = <String as FromSql<diesel::sql_types::Text, Pg>>::from_sql(bytes)?;
        value
            .parse()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Debug, PartialEq, FromSqlRow, AsExpression, Eq, Clone, Copy)]
#[diesel(sql_type = diesel::sql_types::Text)]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

impl ReservationStatus {
    /// States of reservations which occupy their room, i.e. which conflict with overlapping
    /// reservations of the same room
    pub const BLOCKING: [ReservationStatus; 2] =
        [ReservationStatus::Pending, ReservationStatus::Accepted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Accepted => "accepted",
            ReservationStatus::Declined => "declined",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = EnumMemberNotExistingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(ReservationStatus::Pending),
            "accepted" => Ok(ReservationStatus::Accepted),
            "declined" => Ok(ReservationStatus::Declined),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(EnumMemberNotExistingError {
                member_value: value.to_owned(),
                enum_name: "ReservationStatus",
            }),
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReservationStatus> for roombook_api_types::ReservationStatus {
    fn from(value: ReservationStatus) -> Self {
        match value {
            ReservationStatus::Pending => Self::Pending,
            ReservationStatus::Accepted => Self::Accepted,
            ReservationStatus::Declined => Self::Declined,
            ReservationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<roombook_api_types::ReservationStatus> for ReservationStatus {
    fn from(value: roombook_api_types::ReservationStatus) -> Self {
        match value {
            roombook_api_types::ReservationStatus::Pending => Self::Pending,
            roombook_api_types::ReservationStatus::Accepted => Self::Accepted,
            roombook_api_types::ReservationStatus::Declined => Self::Declined,
            roombook_api_types::ReservationStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl ToSql<diesel::sql_types::Text, Pg> for ReservationStatus {
    fn to_sql<'b>(&'b self, out: &mut diesel::serialize::Output<'b, '_, Pg>) -> diesel::serialize::Result {
        <str as ToSql<diesel::sql_types::Text, Pg>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<diesel::sql_types::Text, Pg> for ReservationStatus {
    fn from_sql(bytes: PgValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = <String as FromSql<diesel::sql_types::Text, Pg>>::from_sql(bytes)?;
        value
            .parse()
            .map_err(|e: EnumMemberNotExistingError| e.to_string().into())
    }
}

#[derive(Clone, Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name=super::schema::user_preferences)]
#[diesel(primary_key(user_id))]
pub struct StoredUserPreferences {
    pub user_id: UserId,
    pub preferences: PreferencesJson,
}

/// User preferences, stored as JSON document, such that new preference fields don't require a
/// database migration.
#[derive(Clone, Debug, AsExpression, FromSqlRow)]
#[diesel(sql_type = diesel::sql_types::Jsonb)]
pub struct PreferencesJson(pub roombook_api_types::UserPreferences);

impl<DB> FromSql<diesel::sql_types::Jsonb, DB> for PreferencesJson
where
    DB: diesel::backend::Backend,
    serde_json::Value: FromSql<diesel::sql_types::Jsonb, DB>,
{
    fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
        let value = serde_json::Value::from_sql(bytes)?;
        Ok(Self(serde_json::from_value(value)?))
    }
}

impl<DB> ToSql<diesel::sql_types::Jsonb, DB> for PreferencesJson
where
    DB: diesel::backend::Backend,
    for<'c> DB: diesel::backend::Backend<BindCollector<'c> = RawBytesBindCollector<DB>>,
    serde_json::Value: ToSql<diesel::sql_types::Jsonb, DB>,
{
    fn to_sql<'b>(
        &'b self,
        out: &mut diesel::serialize::Output<'b, '_, DB>,
    ) -> diesel::serialize::Result {
        let value = serde_json::to_value(&self.0)?;
        value.to_sql(&mut out.reborrow())
    }
}
