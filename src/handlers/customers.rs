use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::entities::customer::Model as CustomerModel;
use crate::entities::order::Model as OrderModel;
use crate::entities::reservation::Model as ReservationModel;
use crate::services::customers::{
    AddLoyaltyPointsRequest, CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest,
};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route("/vip", get(list_vip_customers))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route("/:id/orders", get(list_customer_orders))
        .route("/:id/reservations", get(list_customer_reservations))
        .route("/:id/loyalty-points", post(add_loyalty_points))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created", body = CustomerModel),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email or phone already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CustomerModel>>), crate::errors::ServiceError> {
    let customer = state.services.customers.create_customer(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(customer))))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(ListQuery),
    responses((status = 200, description = "Customer list")),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<CustomerModel>> {
    let (items, total) = state
        .services
        .customers
        .list_customers(query.page, query.limit, query.search)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/vip",
    responses((status = 200, description = "VIP customers, highest points first")),
    tag = "customers"
)]
pub async fn list_vip_customers(State(state): State<AppState>) -> ApiResult<Vec<CustomerModel>> {
    Ok(Json(ApiResponse::success(
        state.services.customers.list_vip_customers().await?,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    responses(
        (status = 200, description = "Customer with order count and completed-order spend", body = CustomerResponse),
        (status = 404, description = "Unknown customer", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerResponse> {
    Ok(Json(ApiResponse::success(
        state.services.customers.get_customer_detail(id).await?,
    )))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCustomerRequest>,
) -> ApiResult<CustomerModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .customers
            .update_customer(id, request)
            .await?,
    )))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<OrderModel>> {
    Ok(Json(ApiResponse::success(
        state.services.customers.list_customer_orders(id).await?,
    )))
}

pub async fn list_customer_reservations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<ReservationModel>> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .customers
            .list_customer_reservations(id)
            .await?,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers/{id}/loyalty-points",
    request_body = AddLoyaltyPointsRequest,
    responses(
        (status = 200, description = "Points added; VIP promotion applied at 100", body = CustomerModel),
        (status = 400, description = "Non-positive points", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown customer", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn add_loyalty_points(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AddLoyaltyPointsRequest>,
) -> ApiResult<CustomerModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .customers
            .add_loyalty_points(id, request)
            .await?,
    )))
}
