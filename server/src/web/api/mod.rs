use std::fmt::Display;

mod endpoints_auth;
mod endpoints_capacity;
mod endpoints_facility;
mod endpoints_location;
mod endpoints_reservation;
mod endpoints_room;
mod endpoints_room_type;
#[cfg(test)]
mod tests;

use crate::auth_session::SessionToken;
use crate::data_store::auth_token::{AuthToken, Privilege};
use crate::data_store::models::ReservationStatus;
use crate::data_store::{ReservationId, StoreError};
use crate::web::AppState;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, FromRequest, HttpRequest, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    let query_config =
        web::QueryConfig::default().error_handler(|err, _req| APIError::InvalidQuery(err).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .app_data(query_config)
        .service(endpoints_auth::get_principal)
        .service(endpoints_auth::get_preferences)
        .service(endpoints_auth::update_preferences)
        .service(endpoints_room::list_rooms)
        .service(endpoints_room::get_room)
        .service(endpoints_room::create_room)
        .service(endpoints_room::update_room)
        .service(endpoints_room::delete_room)
        .service(endpoints_room::check_availability)
        .service(endpoints_room_type::list_room_types)
        .service(endpoints_room_type::get_room_type)
        .service(endpoints_room_type::create_room_type)
        .service(endpoints_room_type::update_room_type)
        .service(endpoints_room_type::delete_room_type)
        .service(endpoints_capacity::list_capacities)
        .service(endpoints_capacity::get_capacity)
        .service(endpoints_capacity::create_capacity)
        .service(endpoints_capacity::update_capacity)
        .service(endpoints_capacity::delete_capacity)
        .service(endpoints_location::list_locations)
        .service(endpoints_location::get_location)
        .service(endpoints_location::create_location)
        .service(endpoints_location::update_location)
        .service(endpoints_location::delete_location)
        .service(endpoints_facility::list_facilities)
        .service(endpoints_facility::get_facility)
        .service(endpoints_facility::create_facility)
        .service(endpoints_facility::update_facility)
        .service(endpoints_facility::delete_facility)
        // Fixed paths must be registered before `/reservations/{reservation_id}`
        .service(endpoints_reservation::list_reservations)
        .service(endpoints_reservation::list_own_reservations)
        .service(endpoints_reservation::list_pending_reservations)
        .service(endpoints_reservation::list_calendar_reservations)
        .service(endpoints_reservation::create_reservation)
        .service(endpoints_reservation::get_reservation)
        .service(endpoints_reservation::update_reservation_status)
        .service(endpoints_reservation::cancel_reservation)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    EntityInUse {
        referenced_by: &'static str,
    },
    BookingConflict {
        conflicting_reservations: Vec<ReservationId>,
    },
    InvalidStatusTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
    PermissionDenied {
        required_privilege: Privilege,
    },
    NoSessionToken,
    InvalidSessionToken,
    InvalidJson(JsonPayloadError),
    InvalidQuery(QueryPayloadError),
    InvalidData(String),
    TransactionConflict,
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            },
            Self::EntityInUse { referenced_by } => {
                write!(f, "Element cannot be deleted, because it is still referenced by {}", referenced_by)?;
            },
            Self::BookingConflict { conflicting_reservations } => {
                write!(f, "The room is not available in the requested time. Conflicting reservations: {}",
                       conflicting_reservations
                           .iter()
                           .map(|id| id.to_string())
                           .collect::<Vec<String>>()
                           .join(", "))?;
            },
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Invalid status transition: A {} reservation cannot be changed to {}", from, to)?;
            },
            Self::PermissionDenied{required_privilege} => {
                write!(f, "Client is not authorized to perform this action. Authentication as {} is required.",
                       required_privilege
                           .qualifying_roles()
                           .iter()
                           .map(|role| role.name().to_owned())
                           .collect::<Vec<String>>()
                           .join(" or "))?;
            },
            Self::NoSessionToken => {
                f.write_str("This action requires authentication, but client did not send authentication session token.")?
            },
            Self::InvalidSessionToken => {
                f.write_str("This action requires authentication, but client authentication session given by the client is not valid.")?
            },
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            },
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            },
            Self::InvalidQuery(e) => {
                write!(f, "Invalid query parameters: {}", e)?;
            },
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            },
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            },
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        // Internal details are only written to the log (see http_error_logging)
        let message = match self {
            Self::InternalError(_) => "Internal server error".to_owned(),
            _ => format!("{}", self),
        };

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(json!({
                "httpCode": self.status_code().as_u16(),
                "message": message
            }))
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::CONFLICT,
            Self::EntityInUse { .. } => StatusCode::CONFLICT,
            Self::BookingConflict { .. } => StatusCode::CONFLICT,
            Self::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            Self::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            Self::NoSessionToken => StatusCode::UNAUTHORIZED,
            Self::InvalidSessionToken => StatusCode::UNAUTHORIZED,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::EntityInUse { referenced_by } => Self::EntityInUse { referenced_by },
            StoreError::BookingConflict {
                conflicting_reservations,
            } => Self::BookingConflict {
                conflicting_reservations,
            },
            StoreError::InvalidStatusTransition { from, to } => {
                Self::InvalidStatusTransition { from, to }
            }
            StoreError::PermissionDenied { required_privilege } => {
                Self::PermissionDenied { required_privilege }
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}

impl From<crate::auth_session::SessionError> for APIError {
    fn from(_e: crate::auth_session::SessionError) -> Self {
        APIError::InvalidSessionToken
    }
}

struct SessionTokenHeader(String);
#[allow(clippy::identity_op)] // We want to explicitly state that it's "1" day
pub(super) const SESSION_TOKEN_MAX_AGE: std::time::Duration =
    std::time::Duration::from_secs(1 * 86400);

impl SessionTokenHeader {
    fn session_token(
        &self,
        secret: &str,
    ) -> Result<crate::auth_session::SessionToken, crate::auth_session::SessionError> {
        SessionToken::from_string(&self.0, secret, SESSION_TOKEN_MAX_AGE)
    }
}

impl actix_web::http::header::TryIntoHeaderValue for SessionTokenHeader {
    type Error = actix_web::http::header::InvalidHeaderValue;

    fn try_into_value(self) -> Result<actix_web::http::header::HeaderValue, Self::Error> {
        self.0.parse()
    }
}

impl actix_web::http::header::Header for SessionTokenHeader {
    fn name() -> actix_web::http::header::HeaderName {
        "X-SESSION-TOKEN"
            .try_into()
            .expect("Session Token Header name should be a valid header name")
    }

    fn parse<M: actix_web::HttpMessage>(msg: &M) -> Result<Self, actix_web::error::ParseError> {
        Ok(Self(
            msg.headers()
                .get(Self::name())
                .ok_or(actix_web::error::ParseError::Header)?
                .to_str()
                .unwrap_or("")
                .to_owned(),
        ))
    }
}

/// The authenticated user of a request.
///
/// Extracting this from a request verifies the session token from the `X-SESSION-TOKEN` header
/// once, such that endpoints only receive requests of authenticated users and pass the contained
/// [AuthToken] to the data_store for authorization.
pub struct Principal(pub AuthToken);

impl Principal {
    fn from_http_request(req: &HttpRequest) -> Result<Self, APIError> {
        use actix_web::http::header::Header;
        let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
            APIError::InternalError("Application state is not configured".to_owned())
        })?;
        let session_token = SessionTokenHeader::parse(req)
            .map_err(|_| APIError::NoSessionToken)?
            .session_token(&state.secret)?;
        Ok(Principal(AuthToken::create_for_session(&session_token)))
    }

    pub fn into_inner(self) -> AuthToken {
        self.0
    }
}

impl FromRequest for Principal {
    type Error = APIError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        std::future::ready(Self::from_http_request(req))
    }
}
