
use super::*;
use crate::data_store::auth_token::AccessRole;
use crate::data_store::store_mock::StoreMock;
use crate::data_store::{BookingConflictMode, UserId};
use actix_web::{http, test, App};
use sample_data::*;
use std::sync::Arc;

const APP_SECRET: &str = "123456";

fn create_state(mode: BookingConflictMode) -> (Arc<StoreMock>, AppState) {
    let data_store_mock = Arc::new(StoreMock::default());
    fill_sample_data(data_store_mock.as_ref());
    let state = AppState {
        store: data_store_mock.clone(),
        secret: APP_SECRET.to_string(),
        booking_mode: mode,
    };
    (data_store_mock, state)
}

fn session_header(user_id: UserId, role: AccessRole) -> (String, String) {
    (
        "X-SESSION-TOKEN".to_string(),
        SessionToken::new(user_id, role).as_string(APP_SECRET),
    )
}

fn user_header() -> (String, String) {
    session_header(USER_ID, AccessRole::User)
}

fn admin_header() -> (String, String) {
    session_header(ADMIN_ID, AccessRole::Admin)
}

fn availability_uri(room_id: uuid::Uuid, begin: &str, end: &str) -> String {
    format!(
        "/api/v1/rooms/{}/availability?startTime=2030-05-06T{}:00Z&endTime=2030-05-06T{}:00Z",
        room_id, begin, end
    )
}

fn new_reservation_body(begin: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "roomId": ROOM_ID,
        "eventName": "Sprint planning",
        "startTime": format!("2030-05-06T{}:00Z", begin),
        "endTime": format!("2030-05-06T{}:00Z", end),
        "participants": 5,
    })
}

#[actix_web::test]
async fn test_availability() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    // Overlaps with the accepted reservation 09:00–10:00
    let req = test::TestRequest::get()
        .uri(&availability_uri(ROOM_ID, "09:30", "10:30"))
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let result: roombook_api_types::AvailabilityResult = test::read_body_json(res).await;
    assert!(!result.is_available);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].id, ACCEPTED_RESERVATION_ID);

    // Back-to-back windows don't conflict, declined (10–11) and cancelled (11–12) reservations
    // don't block
    for (begin, end) in [("08:00", "09:00"), ("10:00", "11:00"), ("10:00", "13:00")] {
        let req = test::TestRequest::get()
            .uri(&availability_uri(ROOM_ID, begin, end))
            .append_header(user_header())
            .to_request();
        let result: roombook_api_types::AvailabilityResult =
            test::call_and_read_body_json(&app, req).await;
        assert!(result.is_available, "{}–{} should be available", begin, end);
        assert!(result.conflicts.is_empty());
    }

    // Pending reservations block
    let req = test::TestRequest::get()
        .uri(&availability_uri(ROOM_ID, "13:30", "15:00"))
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::AvailabilityResult =
        test::call_and_read_body_json(&app, req).await;
    assert!(!result.is_available);
    assert_eq!(result.conflicts[0].id, PENDING_RESERVATION_ID);

    // ... unless they are excluded
    let req = test::TestRequest::get()
        .uri(&format!(
            "{}&excludeReservationId={}",
            availability_uri(ROOM_ID, "13:30", "15:00"),
            PENDING_RESERVATION_ID
        ))
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::AvailabilityResult =
        test::call_and_read_body_json(&app, req).await;
    assert!(result.is_available);

    // Other rooms are not affected
    let req = test::TestRequest::get()
        .uri(&availability_uri(UNUSED_ROOM_ID, "09:30", "10:30"))
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::AvailabilityResult =
        test::call_and_read_body_json(&app, req).await;
    assert!(result.is_available);
}

#[actix_web::test]
async fn test_availability_invalid_requests() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    for (begin, end) in [("10:00", "10:00"), ("11:00", "10:00")] {
        let req = test::TestRequest::get()
            .uri(&availability_uri(ROOM_ID, begin, end))
            .append_header(user_header())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    let req = test::TestRequest::get()
        .uri(&availability_uri(uuid::Uuid::now_v7(), "09:00", "10:00"))
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/rooms/{}/availability?startTime=tomorrow", ROOM_ID))
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_rooms_pagination() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms?page=1&pageSize=2")
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let result: roombook_api_types::Page<roombook_api_types::Room> =
        test::read_body_json(res).await;
    assert_eq!(result.data.len(), 2);
    assert_eq!(
        result.pagination,
        roombook_api_types::Pagination {
            page: 1,
            page_size: 2,
            total_count: 3,
            total_pages: 2,
        }
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms?page=5&pageSize=2")
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::Page<roombook_api_types::Room> =
        test::call_and_read_body_json(&app, req).await;
    assert!(result.data.is_empty());
    assert_eq!(result.pagination.total_count, 3);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms?page=9223372036854775807&pageSize=100")
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let result: roombook_api_types::Page<roombook_api_types::Room> =
        test::read_body_json(res).await;
    assert!(result.data.is_empty());
    assert_eq!(result.pagination.total_count, 3);

    for query in ["page=0", "pageSize=0", "pageSize=101"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/rooms?{}", query))
            .append_header(user_header())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[actix_web::test]
async fn test_delete_room() {
    let (store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", UNUSED_ROOM_ID))
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", ROOM_ID))
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);
    assert!(store
        .data
        .lock()
        .unwrap()
        .rooms
        .iter()
        .any(|r| r.room.id == ROOM_ID));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", UNUSED_ROOM_ID))
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/rooms/{}", UNUSED_ROOM_ID))
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_master_data_management() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/capacities")
        .append_header(admin_header())
        .set_json(serde_json::json!({"name": "Large", "minCapacity": 20, "maxCapacity": 10}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/capacities")
        .append_header(user_header())
        .set_json(serde_json::json!({"name": "Large", "minCapacity": 10, "maxCapacity": 40}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/capacities")
        .append_header(admin_header())
        .set_json(serde_json::json!({"name": "Large", "minCapacity": 10, "maxCapacity": 40}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let capacity: roombook_api_types::RoomCapacity = test::read_body_json(res).await;
    assert_eq!(capacity.max_capacity, 40);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/capacities/{}", capacity.id))
        .append_header(admin_header())
        .set_json(serde_json::json!({"name": "Huge", "minCapacity": 10, "maxCapacity": 80}))
        .to_request();
    let updated: roombook_api_types::RoomCapacity =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated.id, capacity.id);
    assert_eq!(updated.name, "Huge");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/room-types/{}", uuid::Uuid::now_v7()))
        .append_header(admin_header())
        .set_json(serde_json::json!({"name": "Lab"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

    // Room codes are unique
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/rooms/{}", ROOM_ID))
        .append_header(admin_header())
        .to_request();
    let room: roombook_api_types::Room = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .append_header(admin_header())
        .set_json(serde_json::json!({
            "code": room.code,
            "name": "Copy",
            "status": "active",
            "roomTypeId": room.room_type_id,
            "capacityId": room.capacity_id,
            "locationId": room.location_id,
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    // Location is referenced by rooms
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/locations/{}", room.location_id))
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_create_reservation() {
    let (store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    // Overlapping requests are accepted in advisory mode
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(new_reservation_body("09:30", "10:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let reservation: roombook_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(reservation.status, roombook_api_types::ReservationStatus::Pending);
    assert_eq!(reservation.user_id, USER_ID);
    assert_eq!(reservation.reviewed_by, None);
    assert_eq!(store.data.lock().unwrap().reservations.len(), 5);

    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(new_reservation_body("10:30", "10:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = new_reservation_body("15:00", "16:00");
    body["roomId"] = serde_json::json!(MAINTENANCE_ROOM_ID);
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = new_reservation_body("15:00", "16:00");
    body["roomId"] = serde_json::json!(uuid::Uuid::now_v7());
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

    // Only admins may book for other users
    let mut body = new_reservation_body("15:00", "16:00");
    body["userId"] = serde_json::json!(OTHER_USER_ID);
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(body.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(admin_header())
        .set_json(body)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
    let reservation: roombook_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(reservation.user_id, OTHER_USER_ID);
    assert_eq!(store.data.lock().unwrap().reservations.len(), 6);
}

#[actix_web::test]
async fn test_create_reservation_strict_mode() {
    let (store, state) = create_state(BookingConflictMode::Strict);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(new_reservation_body("09:30", "10:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);
    assert_eq!(store.data.lock().unwrap().reservations.len(), 4);

    // Touching the accepted reservation and overlapping declined/cancelled ones is fine
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(new_reservation_body("10:00", "12:00"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    // The new pending reservation blocks the same time now
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .set_json(new_reservation_body("11:00", "11:30"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_review_reservation() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;
    let status_uri = format!("/api/v1/reservations/{}/status", PENDING_RESERVATION_ID);

    let req = test::TestRequest::put()
        .uri(&status_uri)
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .set_json(serde_json::json!({"status": "accepted"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&status_uri)
        .append_header(admin_header())
        .set_json(serde_json::json!({"status": "declined", "rejectionReason": "  "}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::put()
        .uri(&status_uri)
        .append_header(admin_header())
        .set_json(serde_json::json!({"status": "accepted"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let reservation: roombook_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(reservation.status, roombook_api_types::ReservationStatus::Accepted);
    assert_eq!(reservation.reviewed_by, Some(ADMIN_ID));
    assert!(reservation.reviewed_at.is_some());

    for status in ["accepted", "pending", "declined"] {
        let req = test::TestRequest::put()
            .uri(&status_uri)
            .append_header(admin_header())
            .set_json(serde_json::json!({"status": status, "rejectionReason": "Too late"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::CONFLICT, "accepted → {}", status);
    }

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/reservations/{}/status", DECLINED_RESERVATION_ID))
        .append_header(admin_header())
        .set_json(serde_json::json!({"status": "accepted"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/reservations/{}/status", uuid::Uuid::now_v7()))
        .append_header(admin_header())
        .set_json(serde_json::json!({"status": "accepted"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unknown_status_value() {
    let (store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/reservations/{}/status", PENDING_RESERVATION_ID))
        .append_header(admin_header())
        .set_json(serde_json::json!({"status": "approved"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let data = store.data.lock().unwrap();
    let reservation = data
        .reservations
        .iter()
        .find(|r| r.id == PENDING_RESERVATION_ID)
        .unwrap();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(reservation.reviewed_by, None);
    assert_eq!(reservation.reviewed_at, None);
}

#[actix_web::test]
async fn test_decline_reservation() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/reservations/{}/status", PENDING_RESERVATION_ID))
        .append_header(admin_header())
        .set_json(serde_json::json!({
            "status": "declined",
            "rejectionReason": "Room is closed for cleaning",
            "reviewedBy": USER_ID,
        }))
        .to_request();
    let reservation: roombook_api_types::Reservation =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(reservation.status, roombook_api_types::ReservationStatus::Declined);
    assert_eq!(reservation.reviewed_by, Some(USER_ID));
    assert_eq!(
        reservation.rejection_reason.as_deref(),
        Some("Room is closed for cleaning")
    );
}

#[actix_web::test]
async fn test_cancel_reservation() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;
    let cancel_uri = format!("/api/v1/reservations/{}/cancel", PENDING_RESERVATION_ID);

    let req = test::TestRequest::post()
        .uri(&cancel_uri)
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&cancel_uri)
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let reservation: roombook_api_types::Reservation = test::read_body_json(res).await;
    assert_eq!(reservation.status, roombook_api_types::ReservationStatus::Cancelled);
    assert_eq!(reservation.reviewed_by, None);

    let req = test::TestRequest::post()
        .uri(&cancel_uri)
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    // Admins cancel accepted reservations of others
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/reservations/{}/cancel", ACCEPTED_RESERVATION_ID))
        .append_header(admin_header())
        .to_request();
    let reservation: roombook_api_types::Reservation =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(reservation.status, roombook_api_types::ReservationStatus::Cancelled);
    assert_eq!(reservation.reviewed_by, Some(ADMIN_ID));
}

#[actix_web::test]
async fn test_get_reservation() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;
    let uri = format!("/api/v1/reservations/{}", ACCEPTED_RESERVATION_ID);

    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(user_header())
        .to_request();
    let first = test::call_and_read_body(&app, req).await;
    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(user_header())
        .to_request();
    let second = test::call_and_read_body(&app, req).await;
    assert_eq!(first, second);
    let reservation: roombook_api_types::Reservation = serde_json::from_slice(&first).unwrap();
    assert_eq!(reservation.id, ACCEPTED_RESERVATION_ID);
    assert_eq!(reservation.start_time, sample_time(9, 0));
    assert_eq!(reservation.reviewed_by, Some(ADMIN_ID));

    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&uri)
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reservations/{}", uuid::Uuid::now_v7()))
        .append_header(admin_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_list_reservations() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reservations/mine")
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::Page<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.pagination.total_count, 2);
    assert!(result.data.iter().all(|r| r.user_id == USER_ID));

    let req = test::TestRequest::get()
        .uri("/api/v1/reservations/pending")
        .append_header(admin_header())
        .to_request();
    let result: roombook_api_types::Page<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, PENDING_RESERVATION_ID);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/reservations?status=declined&roomId={}", ROOM_ID))
        .append_header(admin_header())
        .to_request();
    let result: roombook_api_types::Page<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].id, DECLINED_RESERVATION_ID);

    let req = test::TestRequest::get()
        .uri("/api/v1/reservations?pageSize=100")
        .append_header(admin_header())
        .to_request();
    let result: roombook_api_types::Page<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.pagination.total_count, 4);

    for uri in [
        "/api/v1/reservations",
        "/api/v1/reservations/pending",
        "/api/v1/reservations?status=accepted",
        "/api/v1/reservations?status=pending",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .append_header(session_header(OTHER_USER_ID, AccessRole::User))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[actix_web::test]
async fn test_calendar() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/reservations/calendar?from=2030-05-06T00:00:00Z&to=2030-05-07T00:00:00Z")
        .append_header(session_header(OTHER_USER_ID, AccessRole::User))
        .to_request();
    let result: Vec<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, ACCEPTED_RESERVATION_ID);

    // The accepted reservation ends exactly at `from`
    let req = test::TestRequest::get()
        .uri("/api/v1/reservations/calendar?from=2030-05-06T10:00:00Z&to=2030-05-07T00:00:00Z")
        .append_header(user_header())
        .to_request();
    let result: Vec<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert!(result.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/reservations/calendar?from=2030-05-06T00:00:00Z&to=2030-05-07T00:00:00Z&roomId={}",
            UNUSED_ROOM_ID
        ))
        .append_header(user_header())
        .to_request();
    let result: Vec<roombook_api_types::Reservation> =
        test::call_and_read_body_json(&app, req).await;
    assert!(result.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/v1/reservations/calendar?from=2030-05-07T00:00:00Z&to=2030-05-06T00:00:00Z")
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_ical_feed() {
    let (store, state) = create_state(BookingConflictMode::Advisory);
    {
        // Rooms sorting before A-101 push it onto the second page of the room listing
        let mut data = store.data.lock().unwrap();
        let template = data.rooms.iter().find(|r| r.room.id == ROOM_ID).unwrap().clone();
        for i in 0..120 {
            let mut room = template.clone();
            room.room.id = uuid::Uuid::now_v7();
            room.room.code = format!("0-{:03}", i);
            room.room.name = "Filler".to_string();
            data.rooms.push(room);
        }
    }
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .service(crate::web::ical::ical)
            .app_data(web::Data::new(state)),
    )
    .await;
    let token = SessionToken::new(USER_ID, AccessRole::User).as_string(APP_SECRET);

    let req = test::TestRequest::get()
        .uri(&format!("/calendar.ics?token={}", token))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let content_type = res
        .headers()
        .get(http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/calendar"));
    let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(body.contains(&ACCEPTED_RESERVATION_ID.to_string()));
    assert!(body.contains("SUMMARY:Team meeting"));
    assert!(body.contains("LOCATION:A-101 Lovelace"));
    for id in [
        PENDING_RESERVATION_ID,
        DECLINED_RESERVATION_ID,
        CANCELLED_RESERVATION_ID,
    ] {
        assert!(!body.contains(&id.to_string()), "{}", id);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/calendar.ics?token={}&roomId={}", token, UNUSED_ROOM_ID))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
    let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
    assert!(body.contains("BEGIN:VCALENDAR"));
    assert!(!body.contains("BEGIN:VEVENT"));

    let req = test::TestRequest::get()
        .uri(&format!("/calendar.ics?token={}&roomId={}", token, ROOM_ID))
        .to_request();
    let body = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(body.contains(&ACCEPTED_RESERVATION_ID.to_string()));

    let forged = SessionToken::new(USER_ID, AccessRole::User).as_string("other secret");
    for query in ["token=garbage".to_string(), format!("token={}", forged)] {
        let req = test::TestRequest::get()
            .uri(&format!("/calendar.ics?{}", query))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED, "{}", query);
    }

    let req = test::TestRequest::get().uri("/calendar.ics").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_authentication() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/rooms").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .append_header(("X-SESSION-TOKEN", "not-a-token"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .append_header((
            "X-SESSION-TOKEN",
            SessionToken::new(USER_ID, AccessRole::User).as_string("other secret"),
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/v1/me")
        .append_header(admin_header())
        .to_request();
    let result: roombook_api_types::AuthorizationInfo =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result.user_id, ADMIN_ID);
    assert_eq!(result.role, roombook_api_types::AuthorizationRole::Admin);
}

#[actix_web::test]
async fn test_user_preferences() {
    let (_store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/me/preferences")
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::UserPreferences =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result, roombook_api_types::UserPreferences::default());

    let preferences = roombook_api_types::UserPreferences {
        calendar_view: roombook_api_types::CalendarView::Week,
        locale: "de".to_string(),
        time_format: roombook_api_types::TimeFormat::TwelveHour,
    };
    let req = test::TestRequest::put()
        .uri("/api/v1/me/preferences")
        .append_header(user_header())
        .set_json(&preferences)
        .to_request();
    let result: roombook_api_types::UserPreferences =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result, preferences);

    let req = test::TestRequest::get()
        .uri("/api/v1/me/preferences")
        .append_header(user_header())
        .to_request();
    let result: roombook_api_types::UserPreferences =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result, preferences);

    // Preferences are stored per user
    let req = test::TestRequest::get()
        .uri("/api/v1/me/preferences")
        .append_header(admin_header())
        .to_request();
    let result: roombook_api_types::UserPreferences =
        test::call_and_read_body_json(&app, req).await;
    assert_eq!(result, roombook_api_types::UserPreferences::default());

    let req = test::TestRequest::put()
        .uri("/api/v1/me/preferences")
        .append_header(user_header())
        .set_json(serde_json::json!({"calendarView": "day", "locale": "", "timeFormat": "24h"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_store_error() {
    let (store, state) = create_state(BookingConflictMode::Advisory);
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state)),
    )
    .await;

    store.data.lock().unwrap().next_error = Some(crate::data_store::StoreError::ConnectionError(
        "connection refused".to_string(),
    ));
    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "Internal server error");

    store.data.lock().unwrap().next_error =
        Some(crate::data_store::StoreError::TransactionConflict);
    let req = test::TestRequest::post()
        .uri("/api/v1/reservations")
        .append_header(user_header())
        .set_json(new_reservation_body("15:00", "16:00"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::SERVICE_UNAVAILABLE);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms")
        .append_header(user_header())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);
}
