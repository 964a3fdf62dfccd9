use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::dining_table::Model as TableModel;
use crate::entities::reservation::{Model as ReservationModel, ReservationStatus};
use crate::errors::ServiceError;
use crate::services::reservations::{
    CreateReservationRequest, CreateTableRequest, UpdateReservationRequest,
    UpdateReservationStatusRequest, UpdateTableRequest,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_reservation).get(list_reservations))
        .route("/today", get(today))
        .route("/upcoming", get(upcoming))
        .route("/tables", post(create_table).get(list_tables))
        .route("/tables/available", get(available_tables))
        .route(
            "/tables/:id",
            get(get_table).put(update_table).delete(delete_table),
        )
        .route(
            "/:id",
            get(get_reservation)
                .put(update_reservation)
                .delete(delete_reservation),
        )
        .route("/:id/status", post(update_reservation_status))
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ReservationFilters {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub date: Option<NaiveDate>,
    pub status: Option<ReservationStatus>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = ReservationModel),
        (status = 400, description = "Capacity or guest count violation", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown customer or table", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slot already reserved", body = crate::errors::ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ReservationModel>>), ServiceError> {
    let reservation = state
        .services
        .reservations
        .create_reservation(request)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(reservation))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    params(ReservationFilters),
    responses((status = 200, description = "Reservation list")),
    tag = "reservations"
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ReservationFilters>,
) -> ApiResult<PaginatedResponse<ReservationModel>> {
    let (items, total) = state
        .services
        .reservations
        .list_reservations(query.page, query.limit, query.date, query.status)
        .await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, query.page, query.limit,
    ))))
}

pub async fn today(State(state): State<AppState>) -> ApiResult<Vec<ReservationModel>> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.today().await?,
    )))
}

pub async fn upcoming(State(state): State<AppState>) -> ApiResult<Vec<ReservationModel>> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.upcoming().await?,
    )))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ReservationModel> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.get_reservation(id).await?,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/reservations/{id}",
    request_body = UpdateReservationRequest,
    responses(
        (status = 200, description = "Reservation updated", body = ReservationModel),
        (status = 400, description = "Capacity or guest count violation", body = crate::errors::ErrorResponse),
        (status = 409, description = "Clashes with another booking within two hours", body = crate::errors::ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn update_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReservationRequest>,
) -> ApiResult<ReservationModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .reservations
            .update_reservation(id, request)
            .await?,
    )))
}

pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.reservations.delete_reservation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_reservation_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateReservationStatusRequest>,
) -> ApiResult<ReservationModel> {
    Ok(Json(ApiResponse::success(
        state
            .services
            .reservations
            .update_status(id, request.status)
            .await?,
    )))
}

pub async fn create_table(
    State(state): State<AppState>,
    Json(request): Json<CreateTableRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TableModel>>), ServiceError> {
    let table = state.services.reservations.create_table(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(table))))
}

pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Vec<TableModel>> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.list_tables().await?,
    )))
}

pub async fn get_table(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<TableModel> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.get_table(id).await?,
    )))
}

pub async fn update_table(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTableRequest>,
) -> ApiResult<TableModel> {
    Ok(Json(ApiResponse::success(
        state.services.reservations.update_table(id, request).await?,
    )))
}

pub async fn delete_table(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.reservations.delete_table(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/tables/available",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Available tables, optionally for one slot"),
        (status = 400, description = "Malformed date or time", body = crate::errors::ErrorResponse)
    ),
    tag = "reservations"
)]
pub async fn available_tables(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Vec<TableModel>> {
    let slot = match (query.date, query.time) {
        (None, None) => None,
        (Some(date), Some(time)) => {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                ServiceError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", date))
            })?;
            let time = NaiveTime::parse_from_str(&time, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M:%S"))
                .map_err(|_| {
                    ServiceError::BadRequest(format!("Invalid time '{}', expected HH:MM", time))
                })?;
            Some((date, time))
        }
        _ => {
            return Err(ServiceError::BadRequest(
                "Both date and time are required to check a slot".into(),
            ))
        }
    };

    Ok(Json(ApiResponse::success(
        state.services.reservations.available_tables(slot).await?,
    )))
}
