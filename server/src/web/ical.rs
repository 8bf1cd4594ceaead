use crate::auth_session::SessionToken;
use crate::data_store::auth_token::AuthToken;
use crate::data_store::models::{FullRoom, Reservation, ReservationStatus};
use crate::data_store::{
    PageRequest, ReservationFilterBuilder, ReservationOrder, RoomBookStoreFacade, RoomId,
    StoreError,
};
use crate::web::api::APIError;
use crate::web::AppState;
use actix_web::http::header::DispositionParam;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponseBuilder, Responder};
use icalendar::{Component, EventLike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[allow(clippy::identity_op)] // We want to explicitly state that it's "1" year
pub const ICAL_TOKEN_MAX_AGE: std::time::Duration =
    std::time::Duration::from_secs(1 * 86400 * 365);

/// How far back the feed reaches for reservations that already ended
const ICAL_PAST_DAYS: i64 = 90;

#[get("/calendar.ics")]
pub async fn ical(
    state: web::Data<AppState>,
    query: web::Query<ICalQueryParams>,
) -> Result<impl Responder, APIError> {
    let query = query.into_inner();
    let session_token =
        SessionToken::from_string(&query.session_token, &state.secret, ICAL_TOKEN_MAX_AGE)?;
    let auth = AuthToken::create_for_session(&session_token);

    let mut filter = ReservationFilterBuilder::new();
    filter.status_is_one_of(vec![ReservationStatus::Accepted]);
    filter.ending_after(chrono::Utc::now() - chrono::TimeDelta::days(ICAL_PAST_DAYS));
    if let Some(room_id) = query.room_id {
        filter.in_room(room_id);
    }

    let (reservations, rooms) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let reservations = store
            .get_reservations_filtered(
                &auth,
                filter.build(),
                ReservationOrder::StartTimeAscending,
                None,
            )?
            .items;
        let rooms = load_all_rooms(&mut *store, &auth)?;
        Ok((reservations, rooms))
    })
    .await??;

    Ok(HttpResponseBuilder::new(StatusCode::OK)
        .content_type("text/calendar; charset=utf-8")
        .append_header(actix_web::http::header::ContentDisposition {
            disposition: actix_web::http::header::DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(String::from("roombook.ics"))],
        })
        .body(generate_ical(reservations, rooms)))
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ICalQueryParams {
    #[serde(rename = "token")]
    pub session_token: String,
    pub room_id: Option<RoomId>,
}

fn load_all_rooms<S: RoomBookStoreFacade + ?Sized>(
    store: &mut S,
    auth: &AuthToken,
) -> Result<Vec<FullRoom>, StoreError> {
    let mut rooms = Vec::new();
    let mut page = 1;
    loop {
        let result = store.get_rooms(auth, PageRequest::new(page, PageRequest::MAX_PAGE_SIZE)?)?;
        let exhausted = result.items.is_empty();
        rooms.extend(result.items);
        if exhausted || rooms.len() as i64 >= result.total_count {
            return Ok(rooms);
        }
        page += 1;
    }
}

fn generate_ical(reservations: Vec<Reservation>, rooms: Vec<FullRoom>) -> String {
    let mut calendar = icalendar::Calendar::new().name("RoomBook").done();
    let rooms_by_id: BTreeMap<RoomId, &FullRoom> = rooms.iter().map(|r| (r.room.id, r)).collect();

    for reservation in reservations {
        let event = icalendar::Event::new()
            .uid(&reservation.id.to_string())
            .summary(&reservation.event_name)
            .starts(reservation.start_time)
            .ends(reservation.end_time)
            .description(&generate_ical_description(&reservation))
            .location(&generate_ical_location(&reservation, &rooms_by_id))
            .done();
        calendar.push(event);
    }

    calendar.to_string()
}

fn generate_ical_description(reservation: &Reservation) -> String {
    let mut description = reservation.description.clone();
    if !reservation.notes.is_empty() {
        if !description.is_empty() {
            description.push_str("\n\n");
        }
        description.push_str(&reservation.notes);
    }
    if !description.is_empty() {
        description.push('\n');
    }
    description.push_str(&format!("{} participants", reservation.participants));
    description
}

fn generate_ical_location(reservation: &Reservation, rooms: &BTreeMap<RoomId, &FullRoom>) -> String {
    match rooms.get(&reservation.room_id) {
        Some(room) => format!("{} {}", room.room.code, room.room.name),
        None => String::new(),
    }
}
