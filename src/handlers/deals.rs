// src/handlers/deals.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::deal::{CreateDealPayload, DealList, DealListParams, Order, OrderDetail, UpdateDealPayload},
};

// GET /api/deals
#[utoipa::path(
    get,
    path = "/api/deals",
    tag = "Deals",
    params(DealListParams),
    responses(
        (status = 200, description = "Deals visíveis para o cargo, com totais", body = DealList),
        (status = 403, description = "Cargo sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_deals(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<DealListParams>,
) -> Result<impl IntoResponse, AppError> {
    let deals = app_state.deal_service.list_deals(&user, &params).await?;

    Ok((StatusCode::OK, Json(deals)))
}

// POST /api/deals
#[utoipa::path(
    post,
    path = "/api/deals",
    tag = "Deals",
    request_body = CreateDealPayload,
    responses(
        (status = 201, description = "Lead marcado como ganho e deal criado", body = Order),
        (status = 409, description = "Lead já possui deal"),
        (status = 422, description = "Lead sem vendedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_deal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateDealPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.deal_service.create_deal(&user, &payload).await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/deals/{id}
#[utoipa::path(
    get,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do deal")),
    responses(
        (status = 200, description = "Deal com dados do lead e do vendedor", body = OrderDetail),
        (status = 403, description = "Deal de outro vendedor"),
        (status = 404, description = "Deal não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_deal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.deal_service.get_deal(&user, order_id).await?;

    Ok((StatusCode::OK, Json(order)))
}

// PATCH /api/deals/{id}
#[utoipa::path(
    patch,
    path = "/api/deals/{id}",
    tag = "Deals",
    params(("id" = Uuid, Path, description = "ID do deal")),
    request_body = UpdateDealPayload,
    responses(
        (status = 200, description = "Deal atualizado", body = Order),
        (status = 400, description = "Patch vazio ou valor negativo"),
        (status = 403, description = "Só administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_deal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateDealPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .deal_service
        .update_deal(&user, order_id, payload)
        .await?;

    Ok((StatusCode::OK, Json(order)))
}
