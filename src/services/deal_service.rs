// src/services/deal_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{DealRepository, LeadRepository},
    models::{
        auth::CurrentUser,
        deal::{CreateDealPayload, DealList, DealListParams, DealStats, Order, OrderDetail, UpdateDealPayload},
        lead::LeadStatus,
    },
    services::{
        filters::{DealDateFilter, DealQuery, parse_uuid_param},
        policy::{self, Permission},
    },
};

#[derive(Clone)]
pub struct DealService {
    pool: PgPool,
    repo: DealRepository,
    lead_repo: LeadRepository,
}

impl DealService {
    pub fn new(pool: PgPool, repo: DealRepository, lead_repo: LeadRepository) -> Self {
        Self {
            pool,
            repo,
            lead_repo,
        }
    }

    /// Marca o lead como ganho e abre o deal com o vendedor do lead.
    pub async fn create_deal(
        &self,
        user: &CurrentUser,
        payload: &CreateDealPayload,
    ) -> Result<Order, AppError> {
        policy::authorize(user.role, Permission::CreateDeal)?;
        payload.check_amounts()?;

        let mut tx = self.pool.begin().await?;

        let lead = self
            .lead_repo
            .find_by_id(&mut *tx, payload.lead_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", payload.lead_id)))?;

        policy::check_lead_status_change(user.role, lead.lead.status, LeadStatus::Won)?;
        let sales_rep_id = lead
            .assigned_to_user_id
            .ok_or(AppError::LeadNotAssigned(lead.lead.id))?;

        if self.repo.exists_for_lead(&mut *tx, lead.lead.id).await? {
            return Err(AppError::InvalidTransition(format!(
                "Lead {} already has a deal",
                lead.lead.id
            )));
        }

        let order = self
            .repo
            .create(
                &mut *tx,
                lead.lead.id,
                sales_rep_id,
                payload.amount_in,
                payload.tax_amount,
                payload.middleman_cut,
                payload.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
                payload.final_size_date,
            )
            .await?;

        self.lead_repo
            .set_status(&mut *tx, lead.lead.id, LeadStatus::Won)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Deal {} criado para o lead {} por {} (total {})",
            order.id,
            order.lead_id,
            user.id,
            order.total_value
        );

        Ok(order)
    }

    pub async fn update_deal(
        &self,
        user: &CurrentUser,
        order_id: Uuid,
        payload: UpdateDealPayload,
    ) -> Result<Order, AppError> {
        policy::authorize(user.role, Permission::EditDeal)?;
        let patch = payload.into_patch()?;

        let order = self
            .repo
            .update(order_id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deal {} not found", order_id)))?;

        tracing::info!("Deal {} atualizado por {}", order.id, user.id);

        Ok(order)
    }

    pub async fn get_deal(&self, user: &CurrentUser, order_id: Uuid) -> Result<OrderDetail, AppError> {
        policy::authorize(user.role, Permission::ViewDeals)?;

        let order = self
            .repo
            .find_detail(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Deal {} not found", order_id)))?;

        policy::check_deal_visibility(user.role, user.id, order.order.sales_rep_id)?;

        Ok(order)
    }

    pub async fn list_deals(&self, user: &CurrentUser, params: &DealListParams) -> Result<DealList, AppError> {
        policy::authorize(user.role, Permission::ViewDeals)?;

        let sales_person_id = parse_uuid_param("salesPersonId", params.sales_person_id.as_deref())?;
        let query = DealQuery::for_role(user.role, user.id, sales_person_id).with_date(
            DealDateFilter::parse(params.year.as_deref(), params.month.as_deref())?,
        );

        let items = self.repo.list(&query).await?;
        let stats = DealStats::from_orders(items.iter().map(|d| &d.order));

        Ok(DealList { stats, items })
    }
}
