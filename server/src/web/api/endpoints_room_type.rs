use crate::data_store::models::NewRoomType;
use crate::data_store::RoomTypeId;
use crate::web::api::{APIError, Principal};
use crate::web::util::PageQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/room-types")]
async fn list_room_types(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let room_types = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_room_types(&auth, page)?)
    })
    .await??
    .map(roombook_api_types::RoomType::from)
    .into_api(page);
    Ok(web::Json(room_types))
}

#[get("/room-types/{room_type_id}")]
async fn get_room_type(
    path: web::Path<RoomTypeId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let room_type_id = path.into_inner();
    let auth = principal.into_inner();
    let room_type: roombook_api_types::RoomType = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_room_type(&auth, room_type_id)?)
    })
    .await??
    .into();
    Ok(web::Json(room_type))
}

#[post("/room-types")]
async fn create_room_type(
    data: web::Json<roombook_api_types::RoomTypeData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let room_type = NewRoomType::from_api(data.into_inner(), uuid::Uuid::now_v7());
    if room_type.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let room_type: roombook_api_types::RoomType = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_room_type(&auth, room_type)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(room_type))
}

#[put("/room-types/{room_type_id}")]
async fn update_room_type(
    path: web::Path<RoomTypeId>,
    data: web::Json<roombook_api_types::RoomTypeData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let room_type = NewRoomType::from_api(data.into_inner(), path.into_inner());
    if room_type.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let room_type: roombook_api_types::RoomType = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_room_type(&auth, room_type)?)
    })
    .await??
    .into();
    Ok(web::Json(room_type))
}

#[delete("/room-types/{room_type_id}")]
async fn delete_room_type(
    path: web::Path<RoomTypeId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let room_type_id = path.into_inner();
    let auth = principal.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_room_type(&auth, room_type_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
