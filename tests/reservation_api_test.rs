mod common;

use serde_json::json;

use common::{id_of, response_json, TestApp};

async fn seed_customer(app: &TestApp, email: &str, phone: &str) -> String {
    let response = app
        .post(
            "/api/v1/customers",
            json!({ "name": "Guest", "email": email, "phone": phone }),
        )
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await)
}

async fn seed_table(app: &TestApp, number: i32, capacity: i32) -> String {
    let response = app
        .post(
            "/api/v1/reservations/tables",
            json!({ "table_number": number, "capacity": capacity, "location": "window" }),
        )
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await)
}

async fn book(
    app: &TestApp,
    customer_id: &str,
    table_id: &str,
    date: &str,
    time: &str,
    guests: i32,
) -> axum::response::Response {
    app.post(
        "/api/v1/reservations",
        json!({
            "customer_id": customer_id,
            "table_id": table_id,
            "reservation_date": date,
            "reservation_time": time,
            "number_of_guests": guests
        }),
    )
    .await
}

#[tokio::test]
async fn reservation_lifecycle() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g1@example.com", "5550100001").await;
    let table_id = seed_table(&app, 1, 4).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-10", "19:00", 2).await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "PENDING");
    let reservation_id = id_of(&body);

    let response = app
        .post(
            &format!("/api/v1/reservations/{reservation_id}/status"),
            json!({ "status": "CONFIRMED" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["data"]["status"], "CONFIRMED");
}

#[tokio::test]
async fn guest_count_beyond_capacity_is_rejected() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g2@example.com", "5550100002").await;
    let table_id = seed_table(&app, 2, 4).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-10", "19:00", 6).await;
    assert_eq!(response.status(), 400);

    let response = book(&app, &customer_id, &table_id, "2026-09-10", "19:00", 0).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn duplicate_slot_conflicts() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g3@example.com", "5550100003").await;
    let other_customer = seed_customer(&app, "g4@example.com", "5550100004").await;
    let table_id = seed_table(&app, 3, 4).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-11", "20:00", 2).await;
    assert_eq!(response.status(), 201);

    let response = book(&app, &other_customer, &table_id, "2026-09-11", "20:00", 2).await;
    assert_eq!(response.status(), 409);

    // A different slot on the same table is fine at creation time.
    let response = book(&app, &other_customer, &table_id, "2026-09-11", "18:30", 2).await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn rebooking_a_cancelled_slot_conflicts_on_the_unique_index() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g10@example.com", "5550100010").await;
    let table_id = seed_table(&app, 10, 4).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-20", "19:00", 2).await;
    assert_eq!(response.status(), 201);
    let cancelled = id_of(&response_json(response).await);
    let response = app
        .post(
            &format!("/api/v1/reservations/{cancelled}/status"),
            json!({ "status": "CANCELLED" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    // The slot index ignores status, so the retry is a conflict rather
    // than a server error.
    let response = book(&app, &customer_id, &table_id, "2026-09-20", "19:00", 2).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn updates_enforce_the_two_hour_window() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g5@example.com", "5550100005").await;
    let table_id = seed_table(&app, 4, 6).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-12", "18:00", 2).await;
    assert_eq!(response.status(), 201);

    let response = book(&app, &customer_id, &table_id, "2026-09-12", "21:00", 2).await;
    assert_eq!(response.status(), 201);
    let moving = id_of(&response_json(response).await);

    // 19:30 is within two hours of the 18:00 booking.
    let response = app
        .put(
            &format!("/api/v1/reservations/{moving}"),
            json!({ "reservation_time": "19:30" }),
        )
        .await;
    assert_eq!(response.status(), 409);

    // 22:00 is outside the window.
    let response = app
        .put(
            &format!("/api/v1/reservations/{moving}"),
            json!({ "reservation_time": "22:00" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response_json(response).await["data"]["reservation_time"],
        "22:00:00"
    );
}

#[tokio::test]
async fn update_does_not_conflict_with_itself() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g6@example.com", "5550100006").await;
    let table_id = seed_table(&app, 5, 4).await;

    let response = book(&app, &customer_id, &table_id, "2026-09-13", "19:00", 2).await;
    let reservation_id = id_of(&response_json(response).await);

    let response = app
        .put(
            &format!("/api/v1/reservations/{reservation_id}"),
            json!({ "number_of_guests": 3 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["data"]["number_of_guests"], 3);
}

#[tokio::test]
async fn available_tables_respect_the_requested_slot() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g7@example.com", "5550100007").await;
    let table_a = seed_table(&app, 6, 4).await;
    let _table_b = seed_table(&app, 7, 2).await;

    let response = book(&app, &customer_id, &table_a, "2026-09-14", "19:00", 2).await;
    assert_eq!(response.status(), 201);

    let response = app
        .get("/api/v1/reservations/tables/available?date=2026-09-14&time=19:00")
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let free = body["data"].as_array().unwrap();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0]["table_number"], 7);

    // Without a slot, all available tables are listed.
    let response = app.get("/api/v1/reservations/tables/available").await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_slot_queries_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .get("/api/v1/reservations/tables/available?date=14-09-2026&time=19:00")
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .get("/api/v1/reservations/tables/available?date=2026-09-14")
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn upcoming_excludes_past_and_closed_bookings() {
    let app = TestApp::new().await;
    let customer_id = seed_customer(&app, "g8@example.com", "5550100008").await;
    let table_id = seed_table(&app, 8, 4).await;

    let response = book(&app, &customer_id, &table_id, "2030-01-01", "19:00", 2).await;
    assert_eq!(response.status(), 201);

    let response = book(&app, &customer_id, &table_id, "2030-01-02", "19:00", 2).await;
    let cancelled = id_of(&response_json(response).await);
    app.post(
        &format!("/api/v1/reservations/{cancelled}/status"),
        json!({ "status": "CANCELLED" }),
    )
    .await;

    let response = app.get("/api/v1/reservations/upcoming").await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let upcoming = body["data"].as_array().unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0]["reservation_date"], "2030-01-01");
}

#[tokio::test]
async fn duplicate_table_number_conflicts() {
    let app = TestApp::new().await;
    seed_table(&app, 9, 4).await;

    let response = app
        .post(
            "/api/v1/reservations/tables",
            json!({ "table_number": 9, "capacity": 2 }),
        )
        .await;
    assert_eq!(response.status(), 409);
}
