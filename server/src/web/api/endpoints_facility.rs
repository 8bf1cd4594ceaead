use crate::data_store::models::NewFacility;
use crate::data_store::FacilityId;
use crate::web::api::{APIError, Principal};
use crate::web::util::PageQuery;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/facilities")]
async fn list_facilities(
    query: web::Query<PageQuery>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let page = query.page_request()?;
    let facilities = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_facilities(&auth, page)?)
    })
    .await??
    .map(roombook_api_types::Facility::from)
    .into_api(page);
    Ok(web::Json(facilities))
}

#[get("/facilities/{facility_id}")]
async fn get_facility(
    path: web::Path<FacilityId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let facility_id = path.into_inner();
    let auth = principal.into_inner();
    let facility: roombook_api_types::Facility = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_facility(&auth, facility_id)?)
    })
    .await??
    .into();
    Ok(web::Json(facility))
}

#[post("/facilities")]
async fn create_facility(
    data: web::Json<roombook_api_types::FacilityData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let facility = NewFacility::from_api(data.into_inner(), uuid::Uuid::now_v7());
    if facility.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let facility: roombook_api_types::Facility = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_facility(&auth, facility)?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(facility))
}

#[put("/facilities/{facility_id}")]
async fn update_facility(
    path: web::Path<FacilityId>,
    data: web::Json<roombook_api_types::FacilityData>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let facility = NewFacility::from_api(data.into_inner(), path.into_inner());
    if facility.name.trim().is_empty() {
        return Err(APIError::InvalidData("name must not be empty".to_owned()));
    }
    let facility: roombook_api_types::Facility = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_facility(&auth, facility)?)
    })
    .await??
    .into();
    Ok(web::Json(facility))
}

#[delete("/facilities/{facility_id}")]
async fn delete_facility(
    path: web::Path<FacilityId>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let facility_id = path.into_inner();
    let auth = principal.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_facility(&auth, facility_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
