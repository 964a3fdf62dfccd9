mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use common::{decimal, id_of, response_json, TestApp};

async fn seed_category(app: &TestApp, name: &str) -> String {
    let response = app
        .post("/api/v1/menu/categories", json!({ "name": name }))
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await)
}

async fn seed_item(app: &TestApp, category_id: &str, name: &str, price: &str) -> String {
    let response = app
        .post(
            "/api/v1/menu/items",
            json!({
                "name": name,
                "category_id": category_id,
                "price": price,
                "preparation_time_minutes": 10
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    id_of(&response_json(response).await)
}

#[tokio::test]
async fn category_names_are_unique() {
    let app = TestApp::new().await;
    seed_category(&app, "Starters").await;

    let response = app
        .post("/api/v1/menu/categories", json!({ "name": "Starters" }))
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn menu_item_creation_validates_price_and_category() {
    let app = TestApp::new().await;
    let category_id = seed_category(&app, "Mains").await;

    let response = app
        .post(
            "/api/v1/menu/items",
            json!({
                "name": "Free Lunch",
                "category_id": category_id,
                "price": "0",
                "preparation_time_minutes": 10
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .post(
            "/api/v1/menu/items",
            json!({
                "name": "Orphan Dish",
                "category_id": uuid::Uuid::new_v4(),
                "price": "100.00",
                "preparation_time_minutes": 10
            }),
        )
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn toggling_availability_hides_items_from_the_category_menu() {
    let app = TestApp::new().await;
    let category_id = seed_category(&app, "Desserts").await;
    let item_id = seed_item(&app, &category_id, "Gulab Jamun", "90.00").await;
    seed_item(&app, &category_id, "Kheer", "80.00").await;

    let response = app
        .post(&format!("/api/v1/menu/items/{item_id}/toggle-availability"), json!({}))
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response_json(response).await["data"]["is_available"], false);

    let response = app
        .get(&format!("/api/v1/menu/categories/{category_id}/items"))
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Kheer");
}

#[tokio::test]
async fn menu_item_detail_embeds_its_recipe() {
    let app = TestApp::new().await;
    let category_id = seed_category(&app, "Curries").await;
    let item_id = seed_item(&app, &category_id, "Dal Makhani", "260.00").await;

    let response = app
        .post(
            "/api/v1/inventory/ingredients",
            json!({ "name": "Black Lentils", "unit": "KG", "current_stock": "8.00" }),
        )
        .await;
    let ingredient_id = id_of(&response_json(response).await);
    let response = app
        .post(
            "/api/v1/inventory/recipe-lines",
            json!({
                "menu_item_id": item_id,
                "ingredient_id": ingredient_id,
                "quantity_required": "0.30"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = app.get(&format!("/api/v1/menu/items/{item_id}")).await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(decimal(&body["data"]["price"]), dec!(260.00));
    let recipe = body["data"]["recipe_lines"].as_array().unwrap();
    assert_eq!(recipe.len(), 1);
    assert_eq!(decimal(&recipe[0]["quantity_required"]), dec!(0.30));
}

#[tokio::test]
async fn item_list_filters_by_category_and_search() {
    let app = TestApp::new().await;
    let mains = seed_category(&app, "Mains").await;
    let drinks = seed_category(&app, "Drinks").await;
    seed_item(&app, &mains, "Butter Chicken", "380.00").await;
    seed_item(&app, &drinks, "Masala Chai", "40.00").await;

    let response = app
        .get(&format!("/api/v1/menu/items?category_id={drinks}"))
        .await;
    let body = response_json(response).await;
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Masala Chai");

    let response = app.get("/api/v1/menu/items?search=butter").await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn deleting_a_category_cascades_to_its_items() {
    let app = TestApp::new().await;
    let category_id = seed_category(&app, "Specials").await;
    let item_id = seed_item(&app, &category_id, "Chef Special", "500.00").await;

    let response = app
        .request(
            axum::http::Method::DELETE,
            &format!("/api/v1/menu/categories/{category_id}"),
            None,
        )
        .await;
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/api/v1/menu/items/{item_id}")).await;
    assert_eq!(response.status(), 404);
}
