use crate::data_store::models::NewRoomLocation;
use crate::data_store::LocationId;
use crate::web::api::{APIError, Principal};
use crate::web::util::PageQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/locations")]
async fn list_locations(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let locations = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_locations(&auth, page)?)
    })
    .await??
    .map(roombook_api_types::RoomLocation::from)
    .into_api(page);
    Ok(web::Json(locations))
}

#[get("/locations/{location_id}")]
async fn get_location(
    path: web::Path<LocationId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let location_id = path.into_inner();
    let auth = principal.into_inner();
    let location: roombook_api_types::RoomLocation = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_location(&auth, location_id)?)
    })
    .await??
    .into();
    Ok(web::Json(location))
}

#[post("/locations")]
async fn create_location(
    data: web::Json<roombook_api_types::RoomLocationData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let location = NewRoomLocation::from_api(data.into_inner(), uuid::Uuid::now_v7());
    if location.building.trim().is_empty() {
        return Err(APIError::InvalidData("building must not be empty".to_owned()));
    }
    let location: roombook_api_types::RoomLocation = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_location(&auth, location)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(location))
}

#[put("/locations/{location_id}")]
async fn update_location(
    path: web::Path<LocationId>,
    data: web::Json<roombook_api_types::RoomLocationData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let location = NewRoomLocation::from_api(data.into_inner(), path.into_inner());
    if location.building.trim().is_empty() {
        return Err(APIError::InvalidData("building must not be empty".to_owned()));
    }
    let location: roombook_api_types::RoomLocation = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_location(&auth, location)?)
    })
    .await??
    .into();
    Ok(web::Json(location))
}

#[delete("/locations/{location_id}")]
async fn delete_location(
    path: web::Path<LocationId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let location_id = path.into_inner();
    let auth = principal.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_location(&auth, location_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
