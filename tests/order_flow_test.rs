mod common;

use axum::http::Method;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{decimal, id_of, response_json, TestApp};

/// Seeds a category, a menu item with one recipe line, an ingredient, and a
/// customer. Returns (menu_item_id, ingredient_id, customer_id).
async fn seed_menu(app: &TestApp, price: &str, quantity_required: &str) -> (String, String, String) {
    let response = app
        .post("/api/v1/menu/categories", json!({ "name": "Mains" }))
        .await;
    assert_eq!(response.status(), 201);
    let category_id = id_of(&response_json(response).await);

    let response = app
        .post(
            "/api/v1/menu/items",
            json!({
                "name": "Paneer Tikka",
                "category_id": category_id,
                "price": price,
                "preparation_time_minutes": 20
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let menu_item_id = id_of(&response_json(response).await);

    let response = app
        .post(
            "/api/v1/inventory/ingredients",
            json!({
                "name": "Paneer",
                "unit": "KG",
                "current_stock": "10.00",
                "minimum_stock": "2.00"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let ingredient_id = id_of(&response_json(response).await);

    let response = app
        .post(
            "/api/v1/inventory/recipe-lines",
            json!({
                "menu_item_id": menu_item_id,
                "ingredient_id": ingredient_id,
                "quantity_required": quantity_required
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .post(
            "/api/v1/customers",
            json!({
                "name": "Asha Rao",
                "email": "asha@example.com",
                "phone": "+919876543210"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let customer_id = id_of(&response_json(response).await);

    (menu_item_id, ingredient_id, customer_id)
}

async fn ingredient_stock(app: &TestApp, ingredient_id: &str) -> rust_decimal::Decimal {
    let response = app
        .get(&format!("/api/v1/inventory/ingredients/{ingredient_id}"))
        .await;
    assert_eq!(response.status(), 200);
    decimal(&response_json(response).await["data"]["current_stock"])
}

#[tokio::test]
async fn order_creation_computes_totals_deducts_stock_and_accrues_points() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, customer_id) = seed_menu(&app, "325.25", "0.50").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "table_number": 4,
                "lines": [
                    { "menu_item_id": menu_item_id, "quantity": 2 }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let order = &body["data"];

    // subtotal 650.50, tax 10%, total = subtotal + tax
    assert_eq!(decimal(&order["subtotal"]), dec!(650.50));
    assert_eq!(decimal(&order["tax"]), dec!(65.05));
    assert_eq!(decimal(&order["total"]), dec!(715.55));
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["lines"].as_array().unwrap().len(), 1);
    assert_eq!(decimal(&order["lines"][0]["unit_price"]), dec!(325.25));

    // 0.50 per unit, two units: stock drops 10.00 -> 9.00
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(9.00));

    // One USED ledger entry of -1.00 for the order
    let response = app
        .get(&format!(
            "/api/v1/inventory/transactions?ingredient_id={ingredient_id}&transaction_type=USED"
        ))
        .await;
    assert_eq!(response.status(), 200);
    let ledger = response_json(response).await;
    let entries = ledger["data"]["items"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(decimal(&entries[0]["quantity"]), dec!(-1.00));

    // floor(715.55 / 100) = 7 loyalty points
    let response = app.get(&format!("/api/v1/customers/{customer_id}")).await;
    let customer = response_json(response).await;
    assert_eq!(customer["data"]["loyalty_points"], 7);
    assert_eq!(customer["data"]["is_vip"], false);
}

#[tokio::test]
async fn cancelling_order_does_not_restore_stock() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, customer_id) = seed_menu(&app, "100.00", "1.00").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 3 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let order_id = id_of(&response_json(response).await);
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(7.00));

    let response = app
        .post(
            &format!("/api/v1/orders/{order_id}/status"),
            json!({ "status": "CANCELLED" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    // The consumed stock stays consumed and the USED entry stands.
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(7.00));
    let response = app
        .get(&format!(
            "/api/v1/inventory/transactions?ingredient_id={ingredient_id}"
        ))
        .await;
    let ledger = response_json(response).await;
    assert_eq!(ledger["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn closed_orders_reject_new_items_and_status_changes() {
    let app = TestApp::new().await;
    let (menu_item_id, _, customer_id) = seed_menu(&app, "50.00", "0.10").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            }),
        )
        .await;
    let body = response_json(response).await;
    let order_id = id_of(&body);
    let line_id = body["data"]["lines"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            &format!("/api/v1/orders/{order_id}/status"),
            json!({ "status": "COMPLETED" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            &format!("/api/v1/orders/{order_id}/items"),
            json!({ "menu_item_id": menu_item_id, "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .put(
            &format!("/api/v1/orders/{order_id}/items/{line_id}"),
            json!({ "quantity": 3 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .request(
            axum::http::Method::DELETE,
            &format!("/api/v1/orders/{order_id}/items/{line_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .post(
            &format!("/api/v1/orders/{order_id}/status"),
            json!({ "status": "PENDING" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn adding_a_line_recomputes_totals_and_deducts_more_stock() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, customer_id) = seed_menu(&app, "200.00", "0.25").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            }),
        )
        .await;
    let order_id = id_of(&response_json(response).await);

    let response = app
        .post(
            &format!("/api/v1/orders/{order_id}/items"),
            json!({ "menu_item_id": menu_item_id, "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(400.00));
    assert_eq!(decimal(&body["data"]["total"]), dec!(440.00));
    assert_eq!(body["data"]["lines"].as_array().unwrap().len(), 2);

    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(9.50));

    // Only the creation accrual fired: floor(220 / 100) = 2 points, not 4.
    let response = app.get(&format!("/api/v1/customers/{customer_id}")).await;
    let customer = response_json(response).await;
    assert_eq!(customer["data"]["loyalty_points"], 2);
}

#[tokio::test]
async fn editing_a_line_recomputes_totals_without_touching_stock() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, customer_id) = seed_menu(&app, "100.00", "1.00").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 2 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let order_id = id_of(&body);
    let line_id = body["data"]["lines"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(8.00));

    let response = app
        .put(
            &format!("/api/v1/orders/{order_id}/items/{line_id}"),
            json!({ "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(100.00));
    assert_eq!(decimal(&body["data"]["total"]), dec!(110.00));
    assert_eq!(body["data"]["lines"][0]["quantity"], 1);

    // The edit never reaches the ledger: stock and USED entries stand.
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(8.00));
    let response = app
        .get(&format!(
            "/api/v1/inventory/transactions?ingredient_id={ingredient_id}"
        ))
        .await;
    let ledger = response_json(response).await;
    assert_eq!(ledger["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn removing_a_line_recomputes_totals_but_does_not_restore_stock() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, customer_id) = seed_menu(&app, "100.00", "1.00").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 2 }]
            }),
        )
        .await;
    let body = response_json(response).await;
    let order_id = id_of(&body);
    let line_id = body["data"]["lines"][0]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            axum::http::Method::DELETE,
            &format!("/api/v1/orders/{order_id}/items/{line_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["subtotal"]), dec!(0));
    assert_eq!(decimal(&body["data"]["total"]), dec!(0));
    assert!(body["data"]["lines"].as_array().unwrap().is_empty());

    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(8.00));

    // Unknown line on the order is a 404.
    let response = app
        .put(
            &format!("/api/v1/orders/{order_id}/items/{line_id}"),
            json!({ "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn customer_detail_reports_order_count_and_completed_spend() {
    let app = TestApp::new().await;
    let (menu_item_id, _, customer_id) = seed_menu(&app, "100.00", "0.10").await;

    let mut order_ids: Vec<String> = Vec::new();
    for _ in 0..2 {
        let response = app
            .post(
                "/api/v1/orders",
                json!({
                    "customer_id": customer_id,
                    "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        order_ids.push(id_of(&response_json(response).await));
    }
    app.post(
        &format!("/api/v1/orders/{}/status", order_ids[0]),
        json!({ "status": "COMPLETED" }),
    )
    .await;

    // Spend counts completed orders only; the count covers all of them.
    let response = app.get(&format!("/api/v1/customers/{customer_id}")).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total_orders"], 2);
    assert_eq!(decimal(&body["data"]["total_spent"]), dec!(110.00));
}

#[tokio::test]
async fn big_spender_is_promoted_to_vip_at_creation() {
    let app = TestApp::new().await;
    let (menu_item_id, _, customer_id) = seed_menu(&app, "95000.00", "0.10").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    // total 104500 -> 1045 points, past the 100-point VIP threshold
    let response = app.get(&format!("/api/v1/customers/{customer_id}")).await;
    let customer = response_json(response).await;
    assert_eq!(customer["data"]["loyalty_points"], 1045);
    assert_eq!(customer["data"]["is_vip"], true);

    let response = app.get("/api/v1/customers/vip").await;
    let vips = response_json(response).await;
    assert_eq!(vips["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn statistics_report_counts_and_completed_revenue() {
    let app = TestApp::new().await;
    let (menu_item_id, _, customer_id) = seed_menu(&app, "100.00", "0.10").await;

    let mut order_ids: Vec<String> = Vec::new();
    for _ in 0..3 {
        let response = app
            .post(
                "/api/v1/orders",
                json!({
                    "customer_id": customer_id,
                    "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        order_ids.push(id_of(&response_json(response).await));
    }

    let response = app
        .post(
            &format!("/api/v1/orders/{}/status", order_ids[0]),
            json!({ "status": "COMPLETED" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let response = app
        .post(
            &format!("/api/v1/orders/{}/status", order_ids[1]),
            json!({ "status": "PREPARING" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app.get("/api/v1/orders/statistics").await;
    assert_eq!(response.status(), 200);
    let stats = response_json(response).await;
    assert_eq!(stats["data"]["total_orders"], 3);
    assert_eq!(stats["data"]["pending_orders"], 1);
    assert_eq!(stats["data"]["preparing_orders"], 1);
    assert_eq!(decimal(&stats["data"]["total_revenue"]), dec!(110.00));
}

#[tokio::test]
async fn unknown_customer_fails_order_creation_without_side_effects() {
    let app = TestApp::new().await;
    let (menu_item_id, ingredient_id, _) = seed_menu(&app, "100.00", "1.00").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": uuid::Uuid::new_v4(),
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(ingredient_stock(&app, &ingredient_id).await, dec!(10.00));
}

#[tokio::test]
async fn order_list_filters_by_status() {
    let app = TestApp::new().await;
    let (menu_item_id, _, customer_id) = seed_menu(&app, "100.00", "0.10").await;

    let response = app
        .post(
            "/api/v1/orders",
            json!({
                "customer_id": customer_id,
                "lines": [{ "menu_item_id": menu_item_id, "quantity": 1 }]
            }),
        )
        .await;
    let order_id = id_of(&response_json(response).await);
    app.post(
        &format!("/api/v1/orders/{order_id}/status"),
        json!({ "status": "PREPARING" }),
    )
    .await;

    let response = app.get("/api/v1/orders?status=PREPARING").await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let response = app.get("/api/v1/orders?status=COMPLETED").await;
    let body = response_json(response).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn swagger_document_is_served() {
    let app = TestApp::new().await;
    let response = app.request(Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), 200);
    let doc: Value = response_json(response).await;
    assert!(doc["paths"]["/api/v1/orders"].is_object());
}
