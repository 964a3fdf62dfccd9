use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::recipe_line::Model as RecipeLineModel;
use crate::entities::stock_transaction::{Model as StockTransactionModel, TransactionType};
use crate::services::inventory::{
    CreateIngredientRequest, CreateRecipeLineRequest, CreateStockTransactionRequest,
    IngredientResponse, RestockRequest, UpdateIngredientRequest, UpdateRecipeLineRequest,
};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", post(create_ingredient).get(list_ingredients))
        .route("/ingredients/low-stock", get(list_low_stock))
        .route(
            "/ingredients/:id",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        .route("/ingredients/:id/restock", post(restock_ingredient))
        .route(
            "/recipe-lines",
            post(create_recipe_line).get(list_recipe_lines),
        )
        .route(
            "/recipe-lines/:id",
            get(get_recipe_line)
                .put(update_recipe_line)
                .delete(delete_recipe_line),
        )
        .route("/transactions", post(create_transaction).get(list_transactions))
        .route("/transactions/:id", get(get_transaction))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/ingredients",
    request_body = CreateIngredientRequest,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IngredientResponse>>), crate::errors::ServiceError> {
    let ingredient = state.services.inventory.create_ingredient(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ingredient.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/ingredients",
    params(ListQuery),
    responses((status = 200, description = "Ingredient list")),
    tag = "inventory"
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<IngredientResponse>> {
    let (items, total) = state
        .services
        .inventory
        .list_ingredients(query.page, query.limit, query.search)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items.into_iter().map(IngredientResponse::from).collect(),
        total,
        query.page,
        query.limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/ingredients/low-stock",
    responses((status = 200, description = "Ingredients at or below their minimum")),
    tag = "inventory"
)]
pub async fn list_low_stock(State(state): State<AppState>) -> ApiResult<Vec<IngredientResponse>> {
    let items = state.services.inventory.list_low_stock().await?;
    Ok(Json(ApiResponse::success(
        items.into_iter().map(IngredientResponse::from).collect(),
    )))
}

pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<IngredientResponse> {
    Ok(Json(ApiResponse::success(
        state.services.inventory.get_ingredient(id).await?.into(),
    )))
}

pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateIngredientRequest>,
) -> ApiResult<IngredientResponse> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .inventory
            .update_ingredient(id, request)
            .await?
            .into(),
    )))
}

pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.inventory.delete_ingredient(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/ingredients/{id}/restock",
    request_body = RestockRequest,
    responses(
        (status = 200, description = "Stock added via a PURCHASE ledger entry", body = IngredientResponse),
        (status = 400, description = "Non-positive quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown ingredient", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn restock_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RestockRequest>,
) -> ApiResult<IngredientResponse> {
    Ok(Json(ApiResponse::success(
        state.services.inventory.restock(id, request).await?.into(),
    )))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RecipeLineFilters {
    pub menu_item_id: Option<Uuid>,
    pub ingredient_id: Option<Uuid>,
}

pub async fn create_recipe_line(
    State(state): State<AppState>,
    Json(request): Json<CreateRecipeLineRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecipeLineModel>>), crate::errors::ServiceError> {
    let line = state.services.inventory.create_recipe_line(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(line))))
}

pub async fn list_recipe_lines(
    State(state): State<AppState>,
    Query(query): Query<RecipeLineFilters>,
) -> ApiResult<Vec<RecipeLineModel>> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .inventory
            .list_recipe_lines(query.menu_item_id, query.ingredient_id)
            .await?,
    )))
}

pub async fn get_recipe_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<RecipeLineModel> {
    Ok(Json(ApiResponse::success(
        state.services.inventory.get_recipe_line(id).await?,
    )))
}

pub async fn update_recipe_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipeLineRequest>,
) -> ApiResult<RecipeLineModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .inventory
            .update_recipe_line(id, request)
            .await?,
    )))
}

pub async fn delete_recipe_line(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.inventory.delete_recipe_line(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TransactionFilters {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub ingredient_id: Option<Uuid>,
    pub transaction_type: Option<TransactionType>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory/transactions",
    request_body = CreateStockTransactionRequest,
    responses(
        (status = 201, description = "Ledger entry appended and stock applied", body = StockTransactionModel),
        (status = 400, description = "Non-positive quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown ingredient", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(request): Json<CreateStockTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StockTransactionModel>>), crate::errors::ServiceError> {
    let (entry, _) = state.services.inventory.create_transaction(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(entry))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory/transactions",
    params(TransactionFilters),
    responses((status = 200, description = "Ledger entries, newest first")),
    tag = "inventory"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionFilters>,
) -> ApiResult<PaginatedResponse<StockTransactionModel>> {
    let (items, total) = state
        .services
        .inventory
        .list_transactions(
            query.page,
            query.limit,
            query.ingredient_id,
            query.transaction_type,
        )
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items,
        total,
        query.page,
        query.limit,
    ))))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StockTransactionModel> {
    Ok(Json(ApiResponse::success(
        state.services.inventory.get_transaction(id).await?,
    )))
}
