use crate::data_store::auth_token::Privilege;
use crate::data_store::models::{NewReservation, ReservationStatus, StatusChange};
use crate::data_store::{ReservationFilterBuilder, ReservationId, ReservationOrder, RoomId};
use crate::web::api::{APIError, Principal};
use crate::web::util::{page_request, PageQuery};
use crate::web::AppState;
use actix_web::{get, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReservationListQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    status: Option<roombook_api_types::ReservationStatus>,
    room_id: Option<RoomId>,
}

#[get("/reservations")]
async fn list_reservations(
    query: web::Query<ReservationListQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let query = query.into_inner();
    let auth = principal.into_inner();
    // The accepted-only exemption of the calendar does not apply to the admin listing
    auth.check_privilege(Privilege::ShowAllReservations)?;
    let page = page_request(query.page, query.page_size)?;
    let mut filter = ReservationFilterBuilder::new();
    if let Some(status) = query.status {
        filter.status_is_one_of(vec![status.into()]);
    }
    if let Some(room_id) = query.room_id {
        filter.in_room(room_id);
    }
    let reservations = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_reservations_filtered(
            &auth,
            filter.build(),
            ReservationOrder::CreatedDescending,
            Some(page),
        )?)
    })
    .await??
    .map(roombook_api_types::Reservation::from)
    .into_api(page);
    Ok(web::Json(reservations))
}

#[get("/reservations/mine")]
async fn list_own_reservations(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let mut filter = ReservationFilterBuilder::new();
    filter.of_user(auth.user_id());
    let reservations = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_reservations_filtered(
            &auth,
            filter.build(),
            ReservationOrder::CreatedDescending,
            Some(page),
        )?)
    })
    .await??
    .map(roombook_api_types::Reservation::from)
    .into_api(page);
    Ok(web::Json(reservations))
}

#[get("/reservations/pending")]
async fn list_pending_reservations(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let mut filter = ReservationFilterBuilder::new();
    filter.status_is_one_of(vec![ReservationStatus::Pending]);
    let reservations = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_reservations_filtered(
            &auth,
            filter.build(),
            ReservationOrder::StartTimeAscending,
            Some(page),
        )?)
    })
    .await??
    .map(roombook_api_types::Reservation::from)
    .into_api(page);
    Ok(web::Json(reservations))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    room_id: Option<RoomId>,
}

/// Accepted reservations overlapping `[from, to)`, soonest first
#[get("/reservations/calendar")]
async fn list_calendar_reservations(
    query: web::Query<CalendarQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let query = query.into_inner();
    let auth = principal.into_inner();
    if query.from >= query.to {
        return Err(APIError::InvalidData("from must be before to".to_owned()));
    }
    let mut filter = ReservationFilterBuilder::new();
    filter
        .overlapping(query.from, query.to)
        .status_is_one_of(vec![ReservationStatus::Accepted]);
    if let Some(room_id) = query.room_id {
        filter.in_room(room_id);
    }
    let reservations: Vec<roombook_api_types::Reservation> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            Ok(store.get_reservations_filtered(
                &auth,
                filter.build(),
                ReservationOrder::StartTimeAscending,
                None,
            )?)
        })
        .await??
        .items
        .into_iter()
        .map(roombook_api_types::Reservation::from)
        .collect();
    Ok(web::Json(reservations))
}

#[post("/reservations")]
async fn create_reservation(
    data: web::Json<roombook_api_types::NewReservation>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let data = data.into_inner();
    let user_id = data.user_id.unwrap_or(auth.user_id());
    let reservation = NewReservation::from_api(data, uuid::Uuid::now_v7(), user_id);
    let mode = state.booking_mode;
    let room_id = reservation.room_id;
    let result = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_reservation(&auth, reservation, mode)?)
    })
    .await?;
    if let Err(APIError::BookingConflict {
        conflicting_reservations,
    }) = &result
    {
        info!(
            "Rejected reservation of room {} conflicting with {:?}",
            room_id, conflicting_reservations
        );
    }
    let reservation = result?;
    info!(
        "Reservation {} of room {} requested by user {} for {} to {}",
        reservation.id,
        reservation.room_id,
        reservation.user_id,
        reservation.start_time,
        reservation.end_time
    );
    Ok(HttpResponse::Created().json(roombook_api_types::Reservation::from(reservation)))
}

#[get("/reservations/{reservation_id}")]
async fn get_reservation(
    path: web::Path<ReservationId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let reservation_id = path.into_inner();
    let auth = principal.into_inner();
    let reservation: roombook_api_types::Reservation =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            Ok(store.get_reservation(&auth, reservation_id)?)
        })
        .await??
        .into();
    Ok(web::Json(reservation))
}

#[put("/reservations/{reservation_id}/status")]
async fn update_reservation_status(
    path: web::Path<ReservationId>,
    data: web::Json<roombook_api_types::ReservationStatusUpdate>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    change_status(path.into_inner(), data.into_inner().into(), state, principal).await
}

#[post("/reservations/{reservation_id}/cancel")]
async fn cancel_reservation(
    path: web::Path<ReservationId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let change = StatusChange {
        status: ReservationStatus::Cancelled,
        reviewed_by: None,
        rejection_reason: None,
    };
    change_status(path.into_inner(), change, state, principal).await
}

async fn change_status(
    reservation_id: ReservationId,
    change: StatusChange,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<web::Json<roombook_api_types::Reservation>, APIError> {
    let auth = principal.into_inner();
    let acting_user = auth.user_id();
    let reservation = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_reservation_status(&auth, reservation_id, change)?)
    })
    .await??;
    info!(
        "Reservation {} changed to {} by user {}",
        reservation.id, reservation.status, acting_user
    );
    Ok(web::Json(reservation.into()))
}
