// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::users::get_me,
        handlers::users::list_sales_people,
        handlers::users::list_lead_assignments,

        // --- Leads ---
        handlers::leads::list_leads,
        handlers::leads::create_lead,
        handlers::leads::get_lead,
        handlers::leads::update_lead,
        handlers::leads::get_lead_assignment,

        // --- Quote Requests ---
        handlers::quotes::list_quote_requests,
        handlers::quotes::submit_quote_request,
        handlers::quotes::start_quote_request,
        handlers::quotes::complete_quote_request,

        // --- Deals ---
        handlers::deals::list_deals,
        handlers::deals::create_deal,
        handlers::deals::get_deal,
        handlers::deals::update_deal,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_monthly_orders,
        handlers::dashboard::get_cash_flow,
        handlers::dashboard::get_lead_source_data,
        handlers::dashboard::get_sales_person_data,
    ),
    components(
        schemas(
            // --- Users ---
            models::auth::Role,
            models::auth::CurrentUser,
            models::auth::SalesUser,

            // --- Leads ---
            models::lead::LeadStatus,
            models::lead::PropertyType,
            models::lead::LeadSource,
            models::lead::Lead,
            models::lead::LeadWithAssignment,
            models::lead::LeadAssignment,
            models::lead::LeadPage,
            models::lead::LeadPayload,

            // --- Quote Requests ---
            models::quote::QuoteRequestStatus,
            models::quote::QuoteType,
            models::quote::QuoteRequest,
            models::quote::QuoteRequestDetail,
            models::quote::QuoteRequestCounts,
            models::quote::QuoteRequestBoard,
            models::quote::SubmitQuoteRequestPayload,
            models::quote::StartQuotePayload,
            models::quote::CompleteQuotePayload,

            // --- Deals ---
            models::deal::OrderStatus,
            models::deal::Order,
            models::deal::OrderDetail,
            models::deal::DealStats,
            models::deal::DealList,
            models::deal::CreateDealPayload,
            models::deal::UpdateDealPayload,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::MonthlyOrdersEntry,
            models::dashboard::CashFlowEntry,
            models::dashboard::CategoryShare,
        )
    ),
    tags(
        (name = "Users", description = "Usuário autenticado e vendedores"),
        (name = "Leads", description = "Cadastro, edição e atribuição de leads"),
        (name = "Quote Requests", description = "Fluxo pending -> active -> completed"),
        (name = "Deals", description = "Pedidos gerados a partir de leads ganhos"),
        (name = "Dashboard", description = "Indicadores do topo"),
        (name = "Charts", description = "Séries para os gráficos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
