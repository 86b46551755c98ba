// src/services/lead_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, UserRepository},
    models::{
        auth::{CurrentUser, Role},
        lead::{LeadAssignment, LeadListParams, LeadPage, LeadPayload, LeadStatus, LeadWithAssignment},
    },
    services::{
        filters::{LeadQuery, LeadSort, Pagination, parse_lead_status, parse_uuid_param},
        policy::{self, Permission},
    },
};

/// Status de um lead novo: "new", a não ser que venha explicitamente "unqualified".
pub fn initial_status(requested: Option<LeadStatus>) -> LeadStatus {
    match requested {
        Some(LeadStatus::Unqualified) => LeadStatus::Unqualified,
        _ => LeadStatus::New,
    }
}

/// Todo lead nasce com vendedor, exceto os desqualificados.
pub fn require_assignee(status: LeadStatus, assignee: Option<Uuid>) -> Result<(), AppError> {
    if assignee.is_none() && status != LeadStatus::Unqualified {
        return Err(AppError::invalid("assignedUserId is required"));
    }
    Ok(())
}

/// O lead é visível para o cargo? Mesmas regras da listagem.
pub fn lead_visible_to(user: &CurrentUser, lead: &LeadWithAssignment) -> bool {
    let query = LeadQuery::for_role(user.role, user.id, None);
    if let Some(owner) = query.assigned_to {
        if lead.assigned_to_user_id != Some(owner) {
            return false;
        }
    }
    !(query.hide_closed && lead.lead.status.is_closed())
}

#[derive(Clone)]
pub struct LeadService {
    pool: PgPool,
    repo: LeadRepository,
    user_repo: UserRepository,
}

impl LeadService {
    pub fn new(pool: PgPool, repo: LeadRepository, user_repo: UserRepository) -> Self {
        Self {
            pool,
            repo,
            user_repo,
        }
    }

    // Só vendedores podem ser donos de um lead
    async fn ensure_sales_user(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_id_with(&mut *conn, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        match user.role {
            Some(role) if role.is_sales() => Ok(()),
            _ => Err(AppError::invalid(format!(
                "User {} is not a sales rep or sales manager",
                user_id
            ))),
        }
    }

    pub async fn create_lead(
        &self,
        user: &CurrentUser,
        payload: &LeadPayload,
    ) -> Result<LeadWithAssignment, AppError> {
        policy::authorize(user.role, Permission::CreateLead)?;

        let fields = payload.to_fields()?;
        let status = initial_status(payload.status);
        require_assignee(status, payload.assigned_user_id)?;

        let mut tx = self.pool.begin().await?;

        if let Some(assignee) = payload.assigned_user_id {
            self.ensure_sales_user(&mut tx, assignee).await?;
        }

        let lead = self.repo.create_lead(&mut *tx, &fields, status).await?;

        let assigned_to_user_id = match payload.assigned_user_id {
            Some(assignee) => Some(
                self.repo
                    .upsert_assignment(&mut *tx, lead.id, assignee)
                    .await?
                    .user_id,
            ),
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            "Lead {} criado por {} (status {}, vendedor {:?})",
            lead.id,
            user.id,
            status.as_str(),
            assigned_to_user_id
        );

        Ok(LeadWithAssignment {
            lead,
            assigned_to_user_id,
        })
    }

    pub async fn update_lead(
        &self,
        user: &CurrentUser,
        lead_id: Uuid,
        payload: &LeadPayload,
    ) -> Result<LeadWithAssignment, AppError> {
        policy::authorize(user.role, Permission::EditLead)?;

        let fields = payload.to_fields()?;

        let mut tx = self.pool.begin().await?;

        let current = self
            .repo
            .find_by_id(&mut *tx, lead_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead_id)))?;

        policy::check_lead_ownership(user.role, user.id, lead_id, current.assigned_to_user_id)?;

        let status = payload.status.unwrap_or(current.lead.status);
        policy::check_lead_status_change(user.role, current.lead.status, status)?;
        policy::check_reassignment(
            user.role,
            lead_id,
            current.assigned_to_user_id,
            payload.assigned_user_id,
        )?;

        let reassign_to = payload
            .assigned_user_id
            .filter(|requested| current.assigned_to_user_id != Some(*requested));

        if let Some(assignee) = reassign_to {
            self.ensure_sales_user(&mut tx, assignee).await?;
        }

        let lead = self.repo.update_lead(&mut *tx, lead_id, &fields, status).await?;

        let assigned_to_user_id = match reassign_to {
            Some(assignee) => {
                let assignment = self.repo.upsert_assignment(&mut *tx, lead_id, assignee).await?;
                tracing::info!(
                    "Lead {} reatribuído de {:?} para {} por {}",
                    lead_id,
                    current.assigned_to_user_id,
                    assignee,
                    user.id
                );
                Some(assignment.user_id)
            }
            None => current.assigned_to_user_id,
        };

        tx.commit().await?;

        tracing::info!(
            "Lead {} atualizado por {} ({} -> {})",
            lead_id,
            user.id,
            current.lead.status.as_str(),
            status.as_str()
        );

        Ok(LeadWithAssignment {
            lead,
            assigned_to_user_id,
        })
    }

    pub async fn list_leads(
        &self,
        user: &CurrentUser,
        params: &LeadListParams,
    ) -> Result<LeadPage, AppError> {
        let sales_person_id = parse_uuid_param("salesPersonId", params.sales_person_id.as_deref())?;
        let query = LeadQuery::for_role(user.role, user.id, sales_person_id)
            .with_status(parse_lead_status(params.status.as_deref())?)
            .with_search(params.search.as_deref())
            .with_sort(LeadSort::parse(
                params.sort_by.as_deref(),
                params.sort_dir.as_deref(),
            )?);
        let pagination = Pagination::new(params.page);

        // Total e página lidos do mesmo snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;
        let total = self.repo.count_leads(&mut *tx, &query).await?;
        let items = self.repo.list_leads(&mut *tx, &query, pagination).await?;
        tx.commit().await?;

        Ok(LeadPage {
            items,
            page: pagination.page,
            page_size: pagination.limit(),
            total,
            total_pages: Pagination::total_pages(total),
            has_more: pagination.has_more(total),
        })
    }

    pub async fn get_lead(&self, user: &CurrentUser, lead_id: Uuid) -> Result<LeadWithAssignment, AppError> {
        let lead = self
            .repo
            .find_by_id(self.repo.pool(), lead_id, false)
            .await?
            .filter(|lead| lead_visible_to(user, lead))
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead_id)))?;

        Ok(lead)
    }

    pub async fn get_assignment(
        &self,
        user: &CurrentUser,
        lead_id: Uuid,
    ) -> Result<Option<LeadAssignment>, AppError> {
        self.get_lead(user, lead_id).await?;
        self.repo.find_assignment(self.repo.pool(), lead_id).await
    }

    pub async fn assignments_for_user(
        &self,
        user: &CurrentUser,
        user_id: Uuid,
    ) -> Result<Vec<LeadAssignment>, AppError> {
        if user.role == Role::SalesRep && user.id != user_id {
            return Err(AppError::forbidden("Insufficient permissions"));
        }
        self.repo.list_assignments_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::lead::{Lead, LeadSource, PropertyType};

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            full_name: "Test User".into(),
            role,
        }
    }

    fn lead(status: LeadStatus, assignee: Option<Uuid>) -> LeadWithAssignment {
        LeadWithAssignment {
            lead: Lead {
                id: Uuid::new_v4(),
                name: "Maria".into(),
                address: "12 Harbor Road".into(),
                property_type: PropertyType::Commercial,
                company: None,
                architect_name: None,
                phone_number: "555".into(),
                lead_found_through: LeadSource::Scanner,
                status,
                quote_value: Decimal::ZERO,
                quote_number: None,
                notes: None,
                next_follow_up_date: None,
                lead_created_date: Utc::now(),
            },
            assigned_to_user_id: assignee,
        }
    }

    #[test]
    fn new_leads_start_as_new_unless_unqualified() {
        assert_eq!(initial_status(None), LeadStatus::New);
        assert_eq!(initial_status(Some(LeadStatus::Won)), LeadStatus::New);
        assert_eq!(initial_status(Some(LeadStatus::QuoteMade)), LeadStatus::New);
        assert_eq!(initial_status(Some(LeadStatus::Unqualified)), LeadStatus::Unqualified);
    }

    #[test]
    fn only_unqualified_leads_may_skip_the_assignee() {
        assert!(require_assignee(LeadStatus::New, None).is_err());
        assert!(require_assignee(LeadStatus::Unqualified, None).is_ok());
        assert!(require_assignee(LeadStatus::New, Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn sales_reps_only_see_their_own_open_leads() {
        let rep = user(Role::SalesRep);
        assert!(lead_visible_to(&rep, &lead(LeadStatus::New, Some(rep.id))));
        assert!(!lead_visible_to(&rep, &lead(LeadStatus::New, Some(Uuid::new_v4()))));
        assert!(!lead_visible_to(&rep, &lead(LeadStatus::New, None)));
        assert!(!lead_visible_to(&rep, &lead(LeadStatus::Won, Some(rep.id))));
    }

    #[test]
    fn closed_leads_are_visible_to_admins_and_viewers() {
        let won = lead(LeadStatus::Won, Some(Uuid::new_v4()));
        assert!(lead_visible_to(&user(Role::Admin), &won));
        assert!(lead_visible_to(&user(Role::Viewer), &won));
        assert!(!lead_visible_to(&user(Role::SalesManager), &won));
        assert!(lead_visible_to(&user(Role::SalesManager), &lead(LeadStatus::Unqualified, None)));
    }
}
