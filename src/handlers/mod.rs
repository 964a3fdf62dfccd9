use axum::Router;

use crate::AppState;

pub mod customers;
pub mod inventory;
pub mod menu;
pub mod orders;
pub mod reservations;

/// Everything mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/menu", menu::routes())
        .nest("/inventory", inventory::routes())
        .nest("/customers", customers::routes())
        .nest("/orders", orders::routes())
        .nest("/reservations", reservations::routes())
}
