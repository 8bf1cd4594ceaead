use crate::cli_error::CliError;
use crate::data_store::{get_store_from_env, BookingConflictMode};
use crate::setup::{
    get_booking_conflict_mode_from_env, get_listen_address_from_env, get_listen_port_from_env,
    get_secret_from_env,
};
use actix_web::{middleware, web, App, HttpServer};
use log::info;
use std::sync::Arc;

mod api;
mod http_error_logging;
mod ical;
mod util;

pub fn serve() -> Result<(), CliError> {
    let state = AppState::new()?;
    let listen_address = get_listen_address_from_env()?;
    let listen_port = get_listen_port_from_env()?;
    info!(
        "Starting RoomBook {} on {}:{} with {:?} booking conflict mode",
        crate::get_version(),
        listen_address,
        listen_port,
        state.booking_mode
    );
    actix_web::rt::System::new()
        .block_on(
            HttpServer::new(move || {
                App::new()
                    .configure(api::configure_app)
                    .service(ical::ical)
                    .app_data(web::Data::new(state.clone()))
                    .wrap(middleware::from_fn(
                        http_error_logging::error_logging_middleware,
                    ))
                    .wrap(middleware::Compress::default())
            })
            .bind((listen_address, listen_port))
            .map_err(CliError::BindError)?
            .run(),
        )
        .map_err(CliError::ServerError)
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn crate::data_store::RoomBookStore>,
    secret: String,
    booking_mode: BookingConflictMode,
}

impl AppState {
    pub fn new() -> Result<Self, CliError> {
        Ok(Self {
            store: Arc::new(get_store_from_env()?),
            secret: get_secret_from_env()?,
            booking_mode: get_booking_conflict_mode_from_env()?,
        })
    }
}
