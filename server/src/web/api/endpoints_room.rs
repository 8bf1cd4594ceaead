use crate::data_store::models::FullNewRoom;
use crate::data_store::{ReservationId, RoomId};
use crate::web::api::{APIError, Principal};
use crate::web::util::PageQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[get("/rooms")]
async fn list_rooms(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let rooms = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_rooms(&auth, page)?)
    })
    .await??
    .map(roombook_api_types::Room::from)
    .into_api(page);
    Ok(web::Json(rooms))
}

#[get("/rooms/{room_id}")]
async fn get_room(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let auth = principal.into_inner();
    let room: roombook_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_room(&auth, room_id)?)
    })
    .await??
    .into();
    Ok(web::Json(room))
}

#[post("/rooms")]
async fn create_room(
    data: web::Json<roombook_api_types::RoomData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let room = FullNewRoom::from_api(data.into_inner(), uuid::Uuid::now_v7());
    if room.room.code.is_empty() {
        return Err(APIError::InvalidData("code must not be empty".to_owned()));
    }
    let room: roombook_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_room(&auth, room)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(room))
}

#[put("/rooms/{room_id}")]
async fn update_room(
    path: web::Path<RoomId>,
    data: web::Json<roombook_api_types::RoomData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let room = FullNewRoom::from_api(data.into_inner(), path.into_inner());
    if room.room.code.is_empty() {
        return Err(APIError::InvalidData("code must not be empty".to_owned()));
    }
    let room: roombook_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_room(&auth, room)?)
    })
    .await??
    .into();
    Ok(web::Json(room))
}

#[delete("/rooms/{room_id}")]
async fn delete_room(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let auth = principal.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_room(&auth, room_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude_reservation_id: Option<ReservationId>,
}

#[get("/rooms/{room_id}/availability")]
async fn check_availability(
    path: web::Path<RoomId>,
    query: web::Query<AvailabilityQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let query = query.into_inner();
    let auth = principal.into_inner();
    if query.start_time >= query.end_time {
        return Err(APIError::InvalidData(
            "startTime must be before endTime".to_owned(),
        ));
    }
    let conflicts = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.check_availability(
            &auth,
            room_id,
            query.start_time,
            query.end_time,
            query.exclude_reservation_id,
        )?)
    })
    .await??;

    Ok(web::Json(roombook_api_types::AvailabilityResult {
        is_available: conflicts.is_empty(),
        conflicts: conflicts.into_iter().map(|r| r.into()).collect(),
    }))
}
