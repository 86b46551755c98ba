// src/services/quote_service.rs

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, QuoteRepository, quote_repo::QuoteRequestFilter},
    models::{
        auth::CurrentUser,
        lead::LeadWithAssignment,
        quote::{
            CompleteQuotePayload, QuoteRequest, QuoteRequestBoard, QuoteRequestCounts,
            QuoteRequestListParams, QuoteRequestStatus, StartQuotePayload,
            SubmitQuoteRequestPayload,
        },
    },
    services::{
        filters::{optional_param, parse_quote_type, parse_uuid_param, quote_date_range},
        policy::{self, Permission},
    },
};

/// Vendedor dono do novo pedido: o lead precisa aceitar pedidos e ter vendedor.
pub fn quote_request_owner(lead: &LeadWithAssignment) -> Result<Uuid, AppError> {
    if !lead.lead.status.accepts_quote_requests() {
        return Err(AppError::InvalidTransition(format!(
            "Lead {} is {} and no longer accepts quote requests",
            lead.lead.id,
            lead.lead.status.as_str()
        )));
    }
    lead.assigned_to_user_id
        .ok_or(AppError::LeadNotAssigned(lead.lead.id))
}

/// Confere o lead informado e a transição pedida contra o estado atual.
pub fn check_quote_step(
    request: &QuoteRequest,
    lead_id: Uuid,
    next: QuoteRequestStatus,
) -> Result<(), AppError> {
    if request.lead_id != lead_id {
        return Err(AppError::invalid(format!(
            "Quote request {} does not belong to lead {}",
            request.id, lead_id
        )));
    }
    if !request.status.can_transition_to(next) {
        return Err(transition_error(request.id, request.status, next));
    }
    Ok(())
}

fn transition_error(id: Uuid, from: QuoteRequestStatus, to: QuoteRequestStatus) -> AppError {
    AppError::InvalidTransition(format!(
        "Quote request {} cannot move from {} to {}",
        id,
        from.as_str(),
        to.as_str()
    ))
}

pub fn check_quote_value(value: Decimal) -> Result<(), AppError> {
    if value <= Decimal::ZERO {
        return Err(AppError::invalid("quoteValue must be greater than zero"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct QuoteService {
    pool: PgPool,
    repo: QuoteRepository,
    lead_repo: LeadRepository,
}

impl QuoteService {
    pub fn new(pool: PgPool, repo: QuoteRepository, lead_repo: LeadRepository) -> Self {
        Self {
            pool,
            repo,
            lead_repo,
        }
    }

    pub async fn submit(
        &self,
        user: &CurrentUser,
        payload: &SubmitQuoteRequestPayload,
    ) -> Result<QuoteRequest, AppError> {
        policy::authorize(user.role, Permission::SubmitQuoteRequest)?;

        let mut tx = self.pool.begin().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *tx, payload.lead_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", payload.lead_id)))?;

        policy::check_lead_ownership(user.role, user.id, lead.lead.id, lead.assigned_to_user_id)?;
        let sales_rep_id = quote_request_owner(&lead).inspect_err(|e| {
            tracing::warn!("Pedido de orçamento recusado para o lead {}: {}", lead.lead.id, e);
        })?;

        let request = self
            .repo
            .create(&mut *tx, lead.lead.id, sales_rep_id, payload.quote_type)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Pedido de orçamento {} criado para o lead {} por {}",
            request.id,
            request.lead_id,
            user.id
        );

        Ok(request)
    }

    /// pending -> active, gravando o número do orçamento no lead.
    pub async fn start(
        &self,
        user: &CurrentUser,
        request_id: Uuid,
        payload: &StartQuotePayload,
    ) -> Result<QuoteRequest, AppError> {
        policy::authorize(user.role, Permission::WorkQuoteRequests)?;

        let quote_number = payload.quote_number.trim();
        if quote_number.is_empty() {
            return Err(AppError::invalid("quoteNumber is required"));
        }

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quote request {} not found", request_id)))?;
        check_quote_step(&current, payload.lead_id, QuoteRequestStatus::Active)?;

        // Outro orçamentista pode ter chegado antes
        let request = self
            .repo
            .claim(&mut *tx, request_id, user.id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(format!("Quote request {} is no longer pending", request_id))
            })?;

        self.lead_repo
            .start_quote(&mut *tx, request.lead_id, quote_number)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Pedido de orçamento {} assumido por {} (orçamento {})",
            request.id,
            user.id,
            quote_number
        );

        Ok(request)
    }

    /// active -> completed, copiando o valor para o lead.
    pub async fn complete(
        &self,
        user: &CurrentUser,
        request_id: Uuid,
        payload: &CompleteQuotePayload,
    ) -> Result<QuoteRequest, AppError> {
        policy::authorize(user.role, Permission::WorkQuoteRequests)?;
        check_quote_value(payload.quote_value)?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quote request {} not found", request_id)))?;
        check_quote_step(&current, payload.lead_id, QuoteRequestStatus::Completed)?;

        let request = self
            .repo
            .complete(
                &mut *tx,
                request_id,
                user.id,
                payload.quote_value,
                payload.quote_type,
            )
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition(format!("Quote request {} is no longer active", request_id))
            })?;

        self.lead_repo
            .apply_quote_value(&mut *tx, request.lead_id, request.quote_value)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Pedido de orçamento {} concluído por {} (valor {})",
            request.id,
            user.id,
            request.quote_value
        );

        Ok(request)
    }

    pub async fn list(
        &self,
        user: &CurrentUser,
        params: &QuoteRequestListParams,
    ) -> Result<QuoteRequestBoard, AppError> {
        policy::authorize(user.role, Permission::ViewQuoteRequests)?;

        let filter = QuoteRequestFilter {
            sales_rep_id: parse_uuid_param("salesPersonId", params.sales_person_id.as_deref())?,
            quote_type: parse_quote_type(params.quote_type.as_deref())?,
            quoted_between: quote_date_range(
                params.year.as_deref(),
                params.month.as_deref(),
                Utc::now().date_naive(),
            )?,
            search: optional_param(params.search.as_deref()).map(str::to_owned),
        };

        let items = self.repo.list(&filter).await?;
        let counts = QuoteRequestCounts::tally(items.iter().map(|i| &i.request.status));

        Ok(QuoteRequestBoard { counts, items })
    }
}
