// src/lib.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta o router completo: rotas públicas, rotas protegidas e a documentação.
pub fn build_router(app_state: AppState) -> Router {
    // Usuários
    let user_routes = Router::new()
        .route("/me", get(handlers::users::get_me))
        .route("/sales-people", get(handlers::users::list_sales_people))
        .route("/{id}/lead-assignments", get(handlers::users::list_lead_assignments));

    // Leads
    let lead_routes = Router::new()
        .route(
            "/",
            get(handlers::leads::list_leads).post(handlers::leads::create_lead),
        )
        .route(
            "/{id}",
            get(handlers::leads::get_lead).put(handlers::leads::update_lead),
        )
        .route("/{id}/assignment", get(handlers::leads::get_lead_assignment));

    // Pedidos de orçamento
    let quote_routes = Router::new()
        .route(
            "/",
            get(handlers::quotes::list_quote_requests).post(handlers::quotes::submit_quote_request),
        )
        .route("/{id}/start", post(handlers::quotes::start_quote_request))
        .route("/{id}/complete", post(handlers::quotes::complete_quote_request));

    // Deals
    let deal_routes = Router::new()
        .route(
            "/",
            get(handlers::deals::list_deals).post(handlers::deals::create_deal),
        )
        .route(
            "/{id}",
            get(handlers::deals::get_deal).patch(handlers::deals::update_deal),
        );

    // Dashboard e gráficos
    let chart_routes = Router::new()
        .route("/monthly-orders", get(handlers::dashboard::get_monthly_orders))
        .route("/cash-flow", get(handlers::dashboard::get_cash_flow))
        .route("/lead-source-data", get(handlers::dashboard::get_lead_source_data))
        .route("/sales-person-data", get(handlers::dashboard::get_sales_person_data));

    // Tudo abaixo de /api (exceto /health) exige token
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/leads", lead_routes)
        .nest("/quote-requests", quote_routes)
        .nest("/deals", deal_routes)
        .route("/dashboard/summary", get(handlers::dashboard::get_summary))
        .nest("/charts", chart_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", protected)
        .with_state(app_state)
}
