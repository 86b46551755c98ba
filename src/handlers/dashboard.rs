// src/handlers/dashboard.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::dashboard::{
        CashFlowEntry, CategoryShare, ChartMonthParams, ChartYearParams, DashboardSummary,
        MonthlyOrdersEntry,
    },
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Leads, deals, receita e conversão visíveis para o cargo", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.dashboard_service.summary(&user).await?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/charts/monthly-orders
#[utoipa::path(
    get,
    path = "/api/charts/monthly-orders",
    tag = "Charts",
    params(ChartYearParams),
    responses(
        (status = 200, description = "Valor total e entrada por mês (Jan..Dez)", body = Vec<MonthlyOrdersEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_monthly_orders(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<ChartYearParams>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state
        .dashboard_service
        .monthly_orders(params.year.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/charts/cash-flow
#[utoipa::path(
    get,
    path = "/api/charts/cash-flow",
    tag = "Charts",
    params(ChartYearParams),
    responses(
        (status = 200, description = "Fluxo de caixa esperado por mês da medição final", body = Vec<CashFlowEntry>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cash_flow(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<ChartYearParams>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state
        .dashboard_service
        .cash_flow(params.year.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/charts/lead-source-data
#[utoipa::path(
    get,
    path = "/api/charts/lead-source-data",
    tag = "Charts",
    params(ChartMonthParams),
    responses(
        (status = 200, description = "Valor dos deals do mês por origem do lead", body = Vec<CategoryShare>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lead_source_data(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<ChartMonthParams>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state
        .dashboard_service
        .lead_source_share(params.month.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(data)))
}

// GET /api/charts/sales-person-data
#[utoipa::path(
    get,
    path = "/api/charts/sales-person-data",
    tag = "Charts",
    params(ChartMonthParams),
    responses(
        (status = 200, description = "Valor dos deals do mês por vendedor", body = Vec<CategoryShare>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sales_person_data(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(params): Query<ChartMonthParams>,
) -> Result<impl IntoResponse, AppError> {
    let data = app_state
        .dashboard_service
        .sales_person_share(params.month.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(data)))
}
