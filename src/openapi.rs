use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bistro API",
        description = r#"
Restaurant management backend: menu catalog, inventory with an append-only
stock ledger, customers with a loyalty programme, orders, and table
reservations.

Order creation deducts ingredient stock through each item's recipe and
accrues loyalty points (one per 100 of the order total, VIP at 100 points).
Reservations are guarded by per-slot uniqueness and, on update, a two-hour
overlap window.

List endpoints paginate with `page` and `limit` query parameters.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::menu::create_category,
        crate::handlers::menu::list_categories,
        crate::handlers::menu::list_category_items,
        crate::handlers::menu::create_menu_item,
        crate::handlers::menu::list_menu_items,
        crate::handlers::menu::get_menu_item,
        crate::handlers::menu::toggle_availability,
        crate::handlers::inventory::create_ingredient,
        crate::handlers::inventory::list_ingredients,
        crate::handlers::inventory::list_low_stock,
        crate::handlers::inventory::restock_ingredient,
        crate::handlers::inventory::create_transaction,
        crate::handlers::inventory::list_transactions,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::list_vip_customers,
        crate::handlers::customers::add_loyalty_points,
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::order_statistics,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::add_order_item,
        crate::handlers::orders::update_order_item,
        crate::handlers::reservations::create_reservation,
        crate::handlers::reservations::list_reservations,
        crate::handlers::reservations::update_reservation,
        crate::handlers::reservations::available_tables,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::entities::category::Model,
        crate::entities::menu_item::Model,
        crate::entities::ingredient::Model,
        crate::entities::ingredient::StockUnit,
        crate::entities::recipe_line::Model,
        crate::entities::stock_transaction::Model,
        crate::entities::stock_transaction::TransactionType,
        crate::entities::customer::Model,
        crate::entities::order::Model,
        crate::entities::order::OrderStatus,
        crate::entities::order_line::Model,
        crate::entities::dining_table::Model,
        crate::entities::reservation::Model,
        crate::entities::reservation::ReservationStatus,
    )),
    tags(
        (name = "menu", description = "Menu categories and items"),
        (name = "inventory", description = "Ingredients, recipes, and the stock ledger"),
        (name = "customers", description = "Customers and loyalty"),
        (name = "orders", description = "Orders, lines, and statistics"),
        (name = "reservations", description = "Tables and reservations")
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/docs`, serving the generated document.
pub fn swagger_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
