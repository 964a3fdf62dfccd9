use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::order::{Model as OrderModel, OrderStatus};
use crate::services::orders::{
    CreateOrderLineRequest, CreateOrderRequest, OrderDetail, OrderStatistics, UpdateOrderLineRequest,
    UpdateOrderRequest, UpdateOrderStatusRequest,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/statistics", get(order_statistics))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/status", post(update_order_status))
        .route("/:id/items", post(add_order_item))
        .route(
            "/:id/items/:line_id",
            put(update_order_item).delete(remove_order_item),
        )
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct OrderFilters {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created; stock deducted and loyalty accrued", body = OrderDetail),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown customer or menu item", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderDetail>>), crate::errors::ServiceError> {
    let order = state.services.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderFilters),
    responses((status = 200, description = "Order list, newest first")),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderFilters>,
) -> ApiResult<PaginatedResponse<OrderModel>> {
    let (items, total) = state
        .services
        .orders
        .list_orders(query.page, query.limit, query.status, query.customer_id)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/statistics",
    responses((status = 200, description = "Order counts and completed revenue", body = OrderStatistics)),
    tag = "orders"
)]
pub async fn order_statistics(State(state): State<AppState>) -> ApiResult<OrderStatistics> {
    Ok(Json(ApiResponse::success(
        state.services.orders.statistics().await?,
    )))
}

pub async fn get_order(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<OrderDetail> {
    Ok(Json(ApiResponse::success(
        state.services.orders.get_order(id).await?,
    )))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderRequest>,
) -> ApiResult<OrderModel> {
    Ok(Json(ApiResponse::success(
        state.services.orders.update_order(id, request).await?,
    )))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed; cancellation does not restore stock", body = OrderModel),
        (status = 400, description = "Order already closed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<OrderModel> {
    Ok(Json(ApiResponse::success(
        state.services.orders.update_status(id, request.status).await?,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/items",
    request_body = CreateOrderLineRequest,
    responses(
        (status = 200, description = "Line added, totals recomputed", body = OrderDetail),
        (status = 400, description = "Order already closed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order or menu item", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn add_order_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateOrderLineRequest>,
) -> ApiResult<OrderDetail> {
    Ok(Json(ApiResponse::success(
        state.services.orders.add_line(id, request).await?,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/items/{line_id}",
    request_body = UpdateOrderLineRequest,
    responses(
        (status = 200, description = "Line changed, totals recomputed; stock is not adjusted", body = OrderDetail),
        (status = 400, description = "Order already closed or invalid quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown order or line", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn update_order_item(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateOrderLineRequest>,
) -> ApiResult<OrderDetail> {
    Ok(Json(ApiResponse::success(
        state.services.orders.update_line(id, line_id, request).await?,
    )))
}

pub async fn remove_order_item(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<OrderDetail> {
    Ok(Json(ApiResponse::success(
        state.services.orders.remove_line(id, line_id).await?,
    )))
}
