use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::category::Model as CategoryModel;
use crate::entities::menu_item::Model as MenuItemModel;
use crate::services::catalog::{
    CreateCategoryRequest, CreateMenuItemRequest, MenuItemDetail, UpdateCategoryRequest,
    UpdateMenuItemRequest,
};
use crate::{ApiResponse, ApiResult, AppState, ListQuery, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category).get(list_categories))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/categories/:id/items", get(list_category_items))
        .route("/items", post(create_menu_item).get(list_menu_items))
        .route("/items/available", get(list_available_items))
        .route(
            "/items/:id",
            get(get_menu_item).put(update_menu_item).delete(delete_menu_item),
        )
        .route("/items/:id/toggle-availability", post(toggle_availability))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryModel>>), crate::errors::ServiceError> {
    let category = state.services.catalog.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/categories",
    params(ListQuery),
    responses((status = 200, description = "Category list")),
    tag = "menu"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<PaginatedResponse<CategoryModel>> {
    let (items, total) = state
        .services
        .catalog
        .list_categories(query.page, query.limit)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CategoryModel> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.get_category(id).await?,
    )))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<CategoryModel> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.update_category(id, request).await?,
    )))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/categories/{id}/items",
    responses(
        (status = 200, description = "Available items in the category"),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn list_category_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<MenuItemModel>> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.list_category_items(id).await?,
    )))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct MenuItemFilters {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
}

pub(crate) fn default_page() -> u64 {
    1
}
pub(crate) fn default_limit() -> u64 {
    20
}

#[utoipa::path(
    post,
    path = "/api/v1/menu/items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown category", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(request): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MenuItemModel>>), crate::errors::ServiceError> {
    let item = state.services.catalog.create_menu_item(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/items",
    params(MenuItemFilters),
    responses((status = 200, description = "Menu item list")),
    tag = "menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(query): Query<MenuItemFilters>,
) -> ApiResult<PaginatedResponse<MenuItemModel>> {
    let (items, total) = state
        .services
        .catalog
        .list_menu_items(query.page, query.limit, query.category_id, false, query.search)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

pub async fn list_available_items(
    State(state): State<AppState>,
    Query(query): Query<MenuItemFilters>,
) -> ApiResult<PaginatedResponse<MenuItemModel>> {
    let (items, total) = state
        .services
        .catalog
        .list_menu_items(query.page, query.limit, query.category_id, true, query.search)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/menu/items/{id}",
    responses(
        (status = 200, description = "Menu item with its recipe lines", body = MenuItemDetail),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MenuItemDetail> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.get_menu_item_detail(id).await?,
    )))
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMenuItemRequest>,
) -> ApiResult<MenuItemModel> {
    Ok(Json(ApiResponse::success(
        state.services.catalog.update_menu_item(id, request).await?,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu/items/{id}/toggle-availability",
    responses(
        (status = 200, description = "Availability flipped"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "menu"
)]
pub async fn toggle_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<MenuItemModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .catalog
            .toggle_menu_item_availability(id)
            .await?,
    )))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, crate::errors::ServiceError> {
    state.services.catalog.delete_menu_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
