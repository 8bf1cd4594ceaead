use crate::data_store::models::NewRoomCapacity;
use crate::data_store::CapacityId;
use crate::web::api::{APIError, Principal};
use crate::web::util::PageQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/capacities")]
async fn list_capacities(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let capacities = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_capacities(&auth, page)?)
    })
    .await??
    .map(roombook_api_types::RoomCapacity::from)
    .into_api(page);
    Ok(web::Json(capacities))
}

#[get("/capacities/{capacity_id}")]
async fn get_capacity(
    path: web::Path<CapacityId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let capacity_id = path.into_inner();
    let auth = principal.into_inner();
    let capacity: roombook_api_types::RoomCapacity = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_capacity(&auth, capacity_id)?)
    })
    .await??
    .into();
    Ok(web::Json(capacity))
}

#[post("/capacities")]
async fn create_capacity(
    data: web::Json<roombook_api_types::RoomCapacityData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let capacity = NewRoomCapacity::from_api(data.into_inner(), uuid::Uuid::now_v7());
    if capacity.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let capacity: roombook_api_types::RoomCapacity = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_capacity(&auth, capacity)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(capacity))
}

#[put("/capacities/{capacity_id}")]
async fn update_capacity(
    path: web::Path<CapacityId>,
    data: web::Json<roombook_api_types::RoomCapacityData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let capacity = NewRoomCapacity::from_api(data.into_inner(), path.into_inner());
    if capacity.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let capacity: roombook_api_types::RoomCapacity = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_capacity(&auth, capacity)?)
    })
    .await??
    .into();
    Ok(web::Json(capacity))
}

#[delete("/capacities/{capacity_id}")]
async fn delete_capacity(
    path: web::Path<CapacityId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let capacity_id = path.into_inner();
    let auth = principal.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_capacity(&auth, capacity_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
