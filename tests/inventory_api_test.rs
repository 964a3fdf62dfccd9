mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, id_of, response_json, TestApp};

async fn seed_ingredient(app: &TestApp, name: &str, current: &str, minimum: &str) -> String {
    let response = app
        .post(
            "/api/v1/inventory/ingredients",
            json!({
                "name": name,
                "unit": "KG",
                "current_stock": current,
                "minimum_stock": minimum,
                "cost_per_unit": "120.00",
                "supplier": "Fresh Farms"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await)
}

#[tokio::test]
async fn ingredient_crud_and_low_stock_flag() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Basmati Rice", "5.00", "2.00").await;

    let response = app.get(&format!("/api/v1/inventory/ingredients/{id}")).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_low_stock"], false);
    assert_eq!(body["data"]["stock_status"], "OK");

    // Raising the minimum past the current stock flips the flag.
    let response = app
        .put(
            &format!("/api/v1/inventory/ingredients/{id}"),
            json!({ "minimum_stock": "5.00" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_low_stock"], true);
    assert_eq!(body["data"]["stock_status"], "LOW");

    let response = app.get("/api/v1/inventory/ingredients/low-stock").await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_ingredient_name_conflicts() {
    let app = TestApp::new().await;
    seed_ingredient(&app, "Butter", "1.00", "0.50").await;

    let response = app
        .post(
            "/api/v1/inventory/ingredients",
            json!({ "name": "Butter", "unit": "KG" }),
        )
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn restock_adds_a_purchase_entry_and_bumps_the_timestamp() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Tomatoes", "3.00", "1.00").await;

    let response = app
        .post(
            &format!("/api/v1/inventory/ingredients/{id}/restock"),
            json!({ "quantity": "4.50", "notes": "weekly delivery" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["current_stock"]), dec!(7.50));
    assert!(body["data"]["last_restocked"].is_string());

    let response = app
        .get(&format!(
            "/api/v1/inventory/transactions?ingredient_id={id}&transaction_type=PURCHASE"
        ))
        .await;
    let ledger = response_json(response).await;
    let entries = ledger["data"]["items"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(decimal(&entries[0]["quantity"]), dec!(4.50));

    let response = app
        .post(
            &format!("/api/v1/inventory/ingredients/{id}/restock"),
            json!({ "quantity": "0" }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn waste_and_used_entries_subtract_stock() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Cream", "2.00", "0.50").await;

    let response = app
        .post(
            "/api/v1/inventory/transactions",
            json!({
                "ingredient_id": id,
                "transaction_type": "WASTE",
                "quantity": "0.75",
                "notes": "spoiled"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let entry = response_json(response).await;
    assert_eq!(decimal(&entry["data"]["quantity"]), dec!(-0.75));

    let response = app.get(&format!("/api/v1/inventory/ingredients/{id}")).await;
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["current_stock"]), dec!(1.25));
}

#[tokio::test]
async fn stock_may_go_negative() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Saffron", "0.10", "0.05").await;

    let response = app
        .post(
            "/api/v1/inventory/transactions",
            json!({
                "ingredient_id": id,
                "transaction_type": "USED",
                "quantity": "0.30"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app.get(&format!("/api/v1/inventory/ingredients/{id}")).await;
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["current_stock"]), dec!(-0.20));
}

#[tokio::test]
async fn ledger_is_append_only() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Flour", "10.00", "2.00").await;

    let response = app
        .post(
            "/api/v1/inventory/transactions",
            json!({
                "ingredient_id": id,
                "transaction_type": "ADJUSTMENT",
                "quantity": "1.00"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let entry_id = id_of(&response_json(response).await);

    // No update or delete routes exist for ledger entries.
    let response = app
        .put(
            &format!("/api/v1/inventory/transactions/{entry_id}"),
            json!({ "quantity": "5.00" }),
        )
        .await;
    assert_eq!(response.status(), 405);
    let response = app
        .request(
            axum::http::Method::DELETE,
            &format!("/api/v1/inventory/transactions/{entry_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 405);
}

#[tokio::test]
async fn recipe_lines_reject_duplicate_pairs() {
    let app = TestApp::new().await;
    let ingredient_id = seed_ingredient(&app, "Cheese", "5.00", "1.00").await;

    let response = app
        .post("/api/v1/menu/categories", json!({ "name": "Pizza" }))
        .await;
    let category_id = id_of(&response_json(response).await);
    let response = app
        .post(
            "/api/v1/menu/items",
            json!({
                "name": "Margherita",
                "category_id": category_id,
                "price": "450.00",
                "preparation_time_minutes": 15
            }),
        )
        .await;
    let menu_item_id = id_of(&response_json(response).await);

    let line = json!({
        "menu_item_id": menu_item_id,
        "ingredient_id": ingredient_id,
        "quantity_required": "0.20"
    });
    let response = app.post("/api/v1/inventory/recipe-lines", line.clone()).await;
    assert_eq!(response.status(), 201);

    let response = app.post("/api/v1/inventory/recipe-lines", line).await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn transaction_quantity_must_be_positive() {
    let app = TestApp::new().await;
    let id = seed_ingredient(&app, "Milk", "5.00", "1.00").await;

    let response = app
        .post(
            "/api/v1/inventory/transactions",
            json!({
                "ingredient_id": id,
                "transaction_type": "PURCHASE",
                "quantity": "-2.00"
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}
