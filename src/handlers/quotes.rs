// src/handlers/quotes.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::quote::{
        CompleteQuotePayload, QuoteRequest, QuoteRequestBoard, QuoteRequestListParams,
        StartQuotePayload, SubmitQuoteRequestPayload,
    },
};

// GET /api/quote-requests
#[utoipa::path(
    get,
    path = "/api/quote-requests",
    tag = "Quote Requests",
    params(QuoteRequestListParams),
    responses(
        (status = 200, description = "Pedidos de orçamento com contagem por status", body = QuoteRequestBoard),
        (status = 403, description = "Cargo sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_quote_requests(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(params): Query<QuoteRequestListParams>,
) -> Result<impl IntoResponse, AppError> {
    let board = app_state.quote_service.list(&user, &params).await?;

    Ok((StatusCode::OK, Json(board)))
}

// POST /api/quote-requests
#[utoipa::path(
    post,
    path = "/api/quote-requests",
    tag = "Quote Requests",
    request_body = SubmitQuoteRequestPayload,
    responses(
        (status = 201, description = "Pedido criado como pending", body = QuoteRequest),
        (status = 404, description = "Lead não encontrado"),
        (status = 409, description = "Lead fechado ou desqualificado"),
        (status = 422, description = "Lead sem vendedor")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_quote_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<SubmitQuoteRequestPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.quote_service.submit(&user, &payload).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

// POST /api/quote-requests/{id}/start
#[utoipa::path(
    post,
    path = "/api/quote-requests/{id}/start",
    tag = "Quote Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = StartQuotePayload,
    responses(
        (status = 200, description = "Pedido assumido (active)", body = QuoteRequest),
        (status = 409, description = "Pedido não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn start_quote_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<StartQuotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let request = app_state
        .quote_service
        .start(&user, request_id, &payload)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}

// POST /api/quote-requests/{id}/complete
#[utoipa::path(
    post,
    path = "/api/quote-requests/{id}/complete",
    tag = "Quote Requests",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = CompleteQuotePayload,
    responses(
        (status = 200, description = "Pedido concluído", body = QuoteRequest),
        (status = 400, description = "Valor do orçamento deve ser positivo"),
        (status = 409, description = "Pedido não está ativo")
    ),
    security(("api_jwt" = []))
)]
pub async fn complete_quote_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<CompleteQuotePayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state
        .quote_service
        .complete(&user, request_id, &payload)
        .await?;

    Ok((StatusCode::OK, Json(request)))
}
