// src/handlers/users.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::{CurrentUser, SalesUser}, lead::LeadAssignment},
};

// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Usuário autenticado e seu cargo", body = CurrentUser),
        (status = 401, description = "Token ausente ou inválido"),
        (status = 403, description = "Usuário sem cargo")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<CurrentUser> {
    Json(user)
}

// GET /api/users/sales-people
#[utoipa::path(
    get,
    path = "/api/users/sales-people",
    tag = "Users",
    responses(
        (status = 200, description = "Vendedores (sales_rep e sales_manager)", body = Vec<SalesUser>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales_people(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_repo.list_sales_users().await?;

    Ok((StatusCode::OK, Json(users)))
}

// GET /api/users/{id}/lead-assignments
#[utoipa::path(
    get,
    path = "/api/users/{id}/lead-assignments",
    tag = "Users",
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Leads atribuídos ao usuário", body = Vec<LeadAssignment>),
        (status = 403, description = "Vendedores só consultam a si mesmos")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_lead_assignments(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let assignments = app_state
        .lead_service
        .assignments_for_user(&user, user_id)
        .await?;

    Ok((StatusCode::OK, Json(assignments)))
}
