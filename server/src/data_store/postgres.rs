use super::{
    models, reservation_rules, schema, BookingConflictMode, CapacityId, FacilityId, LocationId,
    PageRequest, Paginated, ReservationFilter, ReservationId, ReservationOrder, RoomBookStore,
    RoomBookStoreFacade, RoomId, RoomTypeId, StoreError,
};
use crate::data_store::auth_token::{AuthToken, Privilege};
use chrono::{DateTime, Utc};
use diesel::dsl::exists;
use diesel::expression::AsExpression;
use diesel::pg::PgConnection;
use diesel::prelude::*;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl RoomBookStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn RoomBookStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

impl RoomBookStoreFacade for PgDataStoreFacade {
    fn get_rooms(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::FullRoom>, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection.transaction(|connection| {
            let total_count = rooms.count().get_result::<i64>(connection)?;
            let the_rooms = rooms
                .order_by((code.asc(), id.asc()))
                .limit(page.page_size)
                .offset(page.offset())
                .select(models::Room::as_select())
                .load::<models::Room>(connection)?;

            let the_room_facilities = models::RoomFacilityMapping::belonging_to(&the_rooms)
                .select(models::RoomFacilityMapping::as_select())
                .load::<models::RoomFacilityMapping>(connection)?
                .grouped_by(&the_rooms);

            Ok(Paginated {
                items: the_rooms
                    .into_iter()
                    .zip(the_room_facilities)
                    .map(|(room, room_facilities)| models::FullRoom {
                        room,
                        facility_ids: room_facilities.into_iter().map(|m| m.facility_id).collect(),
                    })
                    .collect(),
                total_count,
            })
        })
    }

    fn get_room(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
    ) -> Result<models::FullRoom, StoreError> {
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection
            .transaction(|connection| load_full_room(room_id, connection))
    }

    fn create_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::FullNewRoom,
    ) -> Result<models::FullRoom, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let the_room = diesel::insert_into(rooms)
                .values(&room.room)
                .returning(models::Room::as_returning())
                .get_result::<models::Room>(connection)?;
            update_room_facilities(the_room.id, &room.facility_ids, connection)?;
            Ok(models::FullRoom {
                room: the_room,
                facility_ids: room.facility_ids,
            })
        })
    }

    fn update_room(
        &mut self,
        auth_token: &AuthToken,
        room: models::FullNewRoom,
    ) -> Result<models::FullRoom, StoreError> {
        use schema::rooms::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let the_room = diesel::update(rooms)
                .filter(id.eq(room.room.id))
                .set((&room.room, updated_at.eq(diesel::dsl::now)))
                .returning(models::Room::as_returning())
                .get_result::<models::Room>(connection)?;
            update_room_facilities(the_room.id, &room.facility_ids, connection)?;
            Ok(models::FullRoom {
                room: the_room,
                facility_ids: room.facility_ids,
            })
        })
    }

    fn delete_room(&mut self, auth_token: &AuthToken, room_id: RoomId) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let is_referenced = diesel::select(exists(
                schema::reservations::table.filter(schema::reservations::room_id.eq(room_id)),
            ))
            .get_result::<bool>(connection)?;
            if is_referenced {
                return Err(StoreError::EntityInUse {
                    referenced_by: "reservations",
                });
            }

            diesel::delete(
                schema::room_facilities::table.filter(schema::room_facilities::room_id.eq(room_id)),
            )
            .execute(connection)?;
            let count = diesel::delete(schema::rooms::table.filter(schema::rooms::id.eq(room_id)))
                .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_room_types(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomType>, StoreError> {
        use schema::room_types::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection.transaction(|connection| {
            Ok(Paginated {
                total_count: room_types.count().get_result::<i64>(connection)?,
                items: room_types
                    .order_by((name.asc(), id.asc()))
                    .limit(page.page_size)
                    .offset(page.offset())
                    .select(models::RoomType::as_select())
                    .load::<models::RoomType>(connection)?,
            })
        })
    }

    fn get_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type_id: RoomTypeId,
    ) -> Result<models::RoomType, StoreError> {
        use schema::room_types::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        room_types
            .filter(id.eq(room_type_id))
            .select(models::RoomType::as_select())
            .first::<models::RoomType>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type: models::NewRoomType,
    ) -> Result<models::RoomType, StoreError> {
        use schema::room_types::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::insert_into(room_types)
            .values(&room_type)
            .returning(models::RoomType::as_returning())
            .get_result::<models::RoomType>(&mut self.connection)?)
    }

    fn update_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type: models::NewRoomType,
    ) -> Result<models::RoomType, StoreError> {
        use schema::room_types::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::update(room_types)
            .filter(id.eq(room_type.id))
            .set((&room_type, updated_at.eq(diesel::dsl::now)))
            .returning(models::RoomType::as_returning())
            .get_result::<models::RoomType>(&mut self.connection)?)
    }

    fn delete_room_type(
        &mut self,
        auth_token: &AuthToken,
        room_type_id: RoomTypeId,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let is_referenced = diesel::select(exists(
                schema::rooms::table.filter(schema::rooms::room_type_id.eq(room_type_id)),
            ))
            .get_result::<bool>(connection)?;
            if is_referenced {
                return Err(StoreError::EntityInUse {
                    referenced_by: "rooms",
                });
            }
            let count = diesel::delete(
                schema::room_types::table.filter(schema::room_types::id.eq(room_type_id)),
            )
            .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_capacities(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomCapacity>, StoreError> {
        use schema::room_capacities::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection.transaction(|connection| {
            Ok(Paginated {
                total_count: room_capacities.count().get_result::<i64>(connection)?,
                items: room_capacities
                    .order_by((min_capacity.asc(), max_capacity.asc(), id.asc()))
                    .limit(page.page_size)
                    .offset(page.offset())
                    .select(models::RoomCapacity::as_select())
                    .load::<models::RoomCapacity>(connection)?,
            })
        })
    }

    fn get_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity_id: CapacityId,
    ) -> Result<models::RoomCapacity, StoreError> {
        use schema::room_capacities::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        room_capacities
            .filter(id.eq(capacity_id))
            .select(models::RoomCapacity::as_select())
            .first::<models::RoomCapacity>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity: models::NewRoomCapacity,
    ) -> Result<models::RoomCapacity, StoreError> {
        use schema::room_capacities::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;
        reservation_rules::validate_capacity_bounds(capacity.min_capacity, capacity.max_capacity)?;

        Ok(diesel::insert_into(room_capacities)
            .values(&capacity)
            .returning(models::RoomCapacity::as_returning())
            .get_result::<models::RoomCapacity>(&mut self.connection)?)
    }

    fn update_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity: models::NewRoomCapacity,
    ) -> Result<models::RoomCapacity, StoreError> {
        use schema::room_capacities::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;
        reservation_rules::validate_capacity_bounds(capacity.min_capacity, capacity.max_capacity)?;

        Ok(diesel::update(room_capacities)
            .filter(id.eq(capacity.id))
            .set((&capacity, updated_at.eq(diesel::dsl::now)))
            .returning(models::RoomCapacity::as_returning())
            .get_result::<models::RoomCapacity>(&mut self.connection)?)
    }

    fn delete_capacity(
        &mut self,
        auth_token: &AuthToken,
        capacity_id: CapacityId,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let is_referenced = diesel::select(exists(
                schema::rooms::table.filter(schema::rooms::capacity_id.eq(capacity_id)),
            ))
            .get_result::<bool>(connection)?;
            if is_referenced {
                return Err(StoreError::EntityInUse {
                    referenced_by: "rooms",
                });
            }
            let count = diesel::delete(
                schema::room_capacities::table.filter(schema::room_capacities::id.eq(capacity_id)),
            )
            .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_locations(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::RoomLocation>, StoreError> {
        use schema::room_locations::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection.transaction(|connection| {
            Ok(Paginated {
                total_count: room_locations.count().get_result::<i64>(connection)?,
                items: room_locations
                    .order_by((building.asc(), floor.asc(), id.asc()))
                    .limit(page.page_size)
                    .offset(page.offset())
                    .select(models::RoomLocation::as_select())
                    .load::<models::RoomLocation>(connection)?,
            })
        })
    }

    fn get_location(
        &mut self,
        auth_token: &AuthToken,
        location_id: LocationId,
    ) -> Result<models::RoomLocation, StoreError> {
        use schema::room_locations::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        room_locations
            .filter(id.eq(location_id))
            .select(models::RoomLocation::as_select())
            .first::<models::RoomLocation>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_location(
        &mut self,
        auth_token: &AuthToken,
        location: models::NewRoomLocation,
    ) -> Result<models::RoomLocation, StoreError> {
        use schema::room_locations::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::insert_into(room_locations)
            .values(&location)
            .returning(models::RoomLocation::as_returning())
            .get_result::<models::RoomLocation>(&mut self.connection)?)
    }

    fn update_location(
        &mut self,
        auth_token: &AuthToken,
        location: models::NewRoomLocation,
    ) -> Result<models::RoomLocation, StoreError> {
        use schema::room_locations::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::update(room_locations)
            .filter(id.eq(location.id))
            .set((&location, updated_at.eq(diesel::dsl::now)))
            .returning(models::RoomLocation::as_returning())
            .get_result::<models::RoomLocation>(&mut self.connection)?)
    }

    fn delete_location(
        &mut self,
        auth_token: &AuthToken,
        location_id: LocationId,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let is_referenced = diesel::select(exists(
                schema::rooms::table.filter(schema::rooms::location_id.eq(location_id)),
            ))
            .get_result::<bool>(connection)?;
            if is_referenced {
                return Err(StoreError::EntityInUse {
                    referenced_by: "rooms",
                });
            }
            let count = diesel::delete(
                schema::room_locations::table.filter(schema::room_locations::id.eq(location_id)),
            )
            .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn get_facilities(
        &mut self,
        auth_token: &AuthToken,
        page: PageRequest,
    ) -> Result<Paginated<models::Facility>, StoreError> {
        use schema::facilities::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        self.connection.transaction(|connection| {
            Ok(Paginated {
                total_count: facilities.count().get_result::<i64>(connection)?,
                items: facilities
                    .order_by((name.asc(), id.asc()))
                    .limit(page.page_size)
                    .offset(page.offset())
                    .select(models::Facility::as_select())
                    .load::<models::Facility>(connection)?,
            })
        })
    }

    fn get_facility(
        &mut self,
        auth_token: &AuthToken,
        facility_id: FacilityId,
    ) -> Result<models::Facility, StoreError> {
        use schema::facilities::dsl::*;
        auth_token.check_privilege(Privilege::ShowRooms)?;

        facilities
            .filter(id.eq(facility_id))
            .select(models::Facility::as_select())
            .first::<models::Facility>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_facility(
        &mut self,
        auth_token: &AuthToken,
        facility: models::NewFacility,
    ) -> Result<models::Facility, StoreError> {
        use schema::facilities::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::insert_into(facilities)
            .values(&facility)
            .returning(models::Facility::as_returning())
            .get_result::<models::Facility>(&mut self.connection)?)
    }

    fn update_facility(
        &mut self,
        auth_token: &AuthToken,
        facility: models::NewFacility,
    ) -> Result<models::Facility, StoreError> {
        use schema::facilities::dsl::*;
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        Ok(diesel::update(facilities)
            .filter(id.eq(facility.id))
            .set((&facility, updated_at.eq(diesel::dsl::now)))
            .returning(models::Facility::as_returning())
            .get_result::<models::Facility>(&mut self.connection)?)
    }

    fn delete_facility(
        &mut self,
        auth_token: &AuthToken,
        facility_id: FacilityId,
    ) -> Result<(), StoreError> {
        auth_token.check_privilege(Privilege::ManageMasterData)?;

        self.connection.transaction(|connection| {
            let is_referenced = diesel::select(exists(
                schema::room_facilities::table
                    .filter(schema::room_facilities::facility_id.eq(facility_id)),
            ))
            .get_result::<bool>(connection)?;
            if is_referenced {
                return Err(StoreError::EntityInUse {
                    referenced_by: "rooms",
                });
            }
            let count = diesel::delete(
                schema::facilities::table.filter(schema::facilities::id.eq(facility_id)),
            )
            .execute(connection)?;
            if count == 0 {
                return Err(StoreError::NotExisting);
            }
            Ok(())
        })
    }

    fn check_availability(
        &mut self,
        auth_token: &AuthToken,
        room_id: RoomId,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude: Option<ReservationId>,
    ) -> Result<Vec<models::Reservation>, StoreError> {
        auth_token.check_privilege(Privilege::ShowRooms)?;
        reservation_rules::validate_time_window(begin, end)?;

        self.connection.transaction(|connection| {
            let room_exists = diesel::select(exists(
                schema::rooms::table.filter(schema::rooms::id.eq(room_id)),
            ))
            .get_result::<bool>(connection)?;
            if !room_exists {
                return Err(StoreError::NotExisting);
            }
            Ok(load_reservations(
                ReservationFilter::conflicting_with(room_id, begin, end, exclude),
                ReservationOrder::StartTimeAscending,
                None,
                connection,
            )?
            .items)
        })
    }

    fn create_reservation(
        &mut self,
        auth_token: &AuthToken,
        reservation: models::NewReservation,
        mode: BookingConflictMode,
    ) -> Result<models::Reservation, StoreError> {
        reservation_rules::check_booking_privilege(auth_token, &reservation)?;
        reservation_rules::validate_new_reservation(&reservation)?;

        match mode {
            BookingConflictMode::Advisory => self.connection.transaction(|connection| {
                insert_reservation(&reservation, mode, connection)
            }),
            // The availability check and the insertion must see the same snapshot. Concurrent
            // overlapping bookings make all but one transaction fail with a serialization error.
            BookingConflictMode::Strict => self
                .connection
                .build_transaction()
                .serializable()
                .run(|connection| insert_reservation(&reservation, mode, connection)),
        }
    }

    fn get_reservation(
        &mut self,
        auth_token: &AuthToken,
        reservation_id: ReservationId,
    ) -> Result<models::Reservation, StoreError> {
        use schema::reservations::dsl::*;

        let reservation = reservations
            .filter(id.eq(reservation_id))
            .select(models::Reservation::as_select())
            .first::<models::Reservation>(&mut self.connection)?;
        auth_token.check_reservation_privilege(
            reservation.user_id,
            Privilege::ShowOwnReservations,
            Privilege::ShowAllReservations,
        )?;
        Ok(reservation)
    }

    fn get_reservations_filtered(
        &mut self,
        auth_token: &AuthToken,
        filter: ReservationFilter,
        order: ReservationOrder,
        page: Option<PageRequest>,
    ) -> Result<Paginated<models::Reservation>, StoreError> {
        reservation_rules::check_listing_privilege(auth_token, &filter)?;

        self.connection
            .transaction(|connection| Ok(load_reservations(filter, order, page, connection)?))
    }

    fn update_reservation_status(
        &mut self,
        auth_token: &AuthToken,
        reservation_id: ReservationId,
        change: models::StatusChange,
    ) -> Result<models::Reservation, StoreError> {
        use schema::reservations::dsl::*;

        self.connection.transaction(|connection| {
            let current = reservations
                .filter(id.eq(reservation_id))
                .select(models::Reservation::as_select())
                .for_update()
                .first::<models::Reservation>(connection)?;
            let review = reservation_rules::review_for_transition(
                auth_token,
                &current,
                change,
                Utc::now(),
            )?;

            Ok(diesel::update(reservations)
                .filter(id.eq(reservation_id))
                .set(&review)
                .returning(models::Reservation::as_returning())
                .get_result::<models::Reservation>(connection)?)
        })
    }

    fn get_user_preferences(
        &mut self,
        auth_token: &AuthToken,
    ) -> Result<roombook_api_types::UserPreferences, StoreError> {
        use schema::user_preferences::dsl::*;

        Ok(user_preferences
            .filter(user_id.eq(auth_token.user_id()))
            .select(preferences)
            .first::<models::PreferencesJson>(&mut self.connection)
            .optional()?
            .map(|p| p.0)
            .unwrap_or_default())
    }

    fn save_user_preferences(
        &mut self,
        auth_token: &AuthToken,
        new_preferences: roombook_api_types::UserPreferences,
    ) -> Result<(), StoreError> {
        use schema::user_preferences::dsl::*;

        let record = models::StoredUserPreferences {
            user_id: auth_token.user_id(),
            preferences: models::PreferencesJson(new_preferences),
        };
        diesel::insert_into(user_preferences)
            .values(&record)
            .on_conflict(user_id)
            .do_update()
            .set((
                preferences.eq(&record.preferences),
                last_updated.eq(diesel::dsl::now),
            ))
            .execute(&mut self.connection)?;
        Ok(())
    }
}

fn load_full_room(
    room_id: RoomId,
    connection: &mut PgConnection,
) -> Result<models::FullRoom, StoreError> {
    let room = schema::rooms::table
        .filter(schema::rooms::id.eq(room_id))
        .select(models::Room::as_select())
        .first::<models::Room>(connection)?;
    let facility_ids = models::RoomFacilityMapping::belonging_to(&room)
        .select(schema::room_facilities::facility_id)
        .load::<FacilityId>(connection)?;
    Ok(models::FullRoom { room, facility_ids })
}

fn update_room_facilities(
    the_room_id: RoomId,
    facility_ids: &[FacilityId],
    connection: &mut PgConnection,
) -> Result<(), diesel::result::Error> {
    use schema::room_facilities::dsl::*;

    diesel::delete(room_facilities.filter(room_id.eq(the_room_id))).execute(connection)?;

    diesel::insert_into(room_facilities)
        .values(
            facility_ids
                .iter()
                .map(|the_facility_id| models::RoomFacilityMapping {
                    room_id: the_room_id,
                    facility_id: *the_facility_id,
                })
                .collect::<Vec<_>>(),
        )
        .execute(connection)
        .map(|_| ())
}

/// Insert a new reservation after checking the room. In [BookingConflictMode::Strict], the
/// blocking reservations of the room are checked as well, such that this function must be run in
/// a serializable transaction in that mode.
fn insert_reservation(
    reservation: &models::NewReservation,
    mode: BookingConflictMode,
    connection: &mut PgConnection,
) -> Result<models::Reservation, StoreError> {
    let room = schema::rooms::table
        .filter(schema::rooms::id.eq(reservation.room_id))
        .select(models::Room::as_select())
        .first::<models::Room>(connection)?;
    reservation_rules::check_room_bookable(&room)?;

    if mode == BookingConflictMode::Strict {
        let conflicts = load_reservations(
            ReservationFilter::conflicting_with(
                room.id,
                reservation.start_time,
                reservation.end_time,
                None,
            ),
            ReservationOrder::StartTimeAscending,
            None,
            connection,
        )?;
        if !conflicts.items.is_empty() {
            return Err(StoreError::BookingConflict {
                conflicting_reservations: conflicts.items.into_iter().map(|r| r.id).collect(),
            });
        }
    }

    Ok(diesel::insert_into(schema::reservations::table)
        .values(reservation)
        .returning(models::Reservation::as_returning())
        .get_result::<models::Reservation>(connection)?)
}

fn load_reservations(
    filter: ReservationFilter,
    order: ReservationOrder,
    page: Option<PageRequest>,
    connection: &mut PgConnection,
) -> Result<Paginated<models::Reservation>, diesel::result::Error> {
    use schema::reservations::dsl::*;

    let mut query = reservations
        .filter(reservation_filter_to_sql(filter.clone()))
        .select(models::Reservation::as_select())
        .into_boxed();
    query = match order {
        ReservationOrder::StartTimeAscending => {
            query.order_by((start_time.asc(), end_time.asc(), id.asc()))
        }
        ReservationOrder::CreatedDescending => query.order_by((created_at.desc(), id.desc())),
    };

    match page {
        Some(page) => Ok(Paginated {
            total_count: reservations
                .filter(reservation_filter_to_sql(filter))
                .count()
                .get_result::<i64>(connection)?,
            items: query
                .limit(page.page_size)
                .offset(page.offset())
                .load::<models::Reservation>(connection)?,
        }),
        None => {
            let items = query.load::<models::Reservation>(connection)?;
            Ok(Paginated {
                total_count: items.len() as i64,
                items,
            })
        }
    }
}

type BoxedBoolExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, diesel::pg::Pg, SqlType = diesel::sql_types::Bool> + 'a>;

fn reservation_filter_to_sql<'a>(
    filter: ReservationFilter,
) -> BoxedBoolExpression<'a, schema::reservations::table> {
    use schema::reservations::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::reservations::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    // Half-open time windows: reservations ending exactly at `after` or beginning exactly at
    // `before` don't match.
    if let Some(after) = filter.after {
        expression = Box::new(expression.as_expression().and(end_time.gt(after)));
    }
    if let Some(before) = filter.before {
        expression = Box::new(expression.as_expression().and(start_time.lt(before)));
    }
    if let Some(the_room_id) = filter.room {
        expression = Box::new(expression.as_expression().and(room_id.eq(the_room_id)));
    }
    if let Some(the_user_id) = filter.user {
        expression = Box::new(expression.as_expression().and(user_id.eq(the_user_id)));
    }
    if let Some(statuses) = filter.statuses {
        expression = Box::new(expression.as_expression().and(status.eq_any(statuses)));
    }
    if let Some(excluded_id) = filter.exclude {
        expression = Box::new(expression.as_expression().and(id.ne(excluded_id)));
    }
    expression
}

/// Get a human-readable description of the consistency expectation that is checked by a specific
/// constraint in our Postgres database schema by the constraint's name.
///
/// These are visible to the user when creating or updating entities inconsistently via the REST
/// API.
///
/// Returns None, when no human-readable description is present of the given constraint name. This
/// may be the case when we don't expect this constraint to be violated by a user interaction.
pub fn description_for_postgres_constraint(constraint_name: &str) -> Option<&'static str> {
    match constraint_name {
        "reservations_room_id_fkey" => Some("Reservation's room must reference an existing room."),
        "reservations_time_range" => Some("Reservation's start_time must be earlier than end_time."),
        "reservations_participants" => Some("Reservation's participants must be a positive number."),
        "reservations_status" => Some("Reservation's status must be one of pending, accepted, declined, cancelled."),
        "room_capacities_bounds" => Some("Capacity's min_capacity must be non-negative and not greater than max_capacity."),
        "room_facilities_facility_id_fkey" => Some("Room's facilities must reference existing facilities."),
        "rooms_capacity_id_fkey" => Some("Room's capacity must reference an existing capacity."),
        "rooms_location_id_fkey" => Some("Room's location must reference an existing location."),
        "rooms_room_type_id_fkey" => Some("Room's room type must reference an existing room type."),
        "rooms_status" => Some("Room's status must be one of active, maintenance, renovation, inactive."),
        _ => None,
    }
}
