use crate::web::api::{APIError, Principal};
use crate::web::AppState;
use actix_web::{get, put, web, Responder};

#[get("/me")]
async fn get_principal(principal: Principal) -> Result<impl Responder, APIError> {
    Ok(web::Json(principal.into_inner().api_authorization_info()))
}

#[get("/me/preferences")]
async fn get_preferences(
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let preferences = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_user_preferences(&auth)?)
    })
    .await??;
    Ok(web::Json(preferences))
}

#[put("/me/preferences")]
async fn update_preferences(
    data: web::Json<roombook_api_types::UserPreferences>,
    state: web::Data<AppState>,
    principal: Principal,
) -> Result<impl Responder, APIError> {
    let auth = principal.into_inner();
    let preferences = data.into_inner();
    if preferences.locale.trim().is_empty() {
        return Err(APIError::InvalidData("locale must not be empty".to_owned()));
    }
    let preferences = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.save_user_preferences(&auth, preferences)?;
        Ok(store.get_user_preferences(&auth)?)
    })
    .await??;
    Ok(web::Json(preferences))
}
