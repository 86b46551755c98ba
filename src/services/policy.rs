// src/services/policy.rs
//
// Regras de acesso centralizadas: (cargo, ação, estado do recurso) -> permitido / negado.
// Todo serviço que muta ou lista dados passa por aqui.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::Role, lead::LeadStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    CreateLead,
    EditLead,
    ReassignLead,
    // Mover um lead para won/lost
    CloseLead,
    ViewClosedLeads,
    SubmitQuoteRequest,
    WorkQuoteRequests,
    ViewQuoteRequests,
    ViewDeals,
    CreateDeal,
    EditDeal,
    FilterDealsBySalesRep,
}

impl Permission {
    pub fn slug(self) -> &'static str {
        match self {
            Permission::CreateLead => "leads:create",
            Permission::EditLead => "leads:edit",
            Permission::ReassignLead => "leads:reassign",
            Permission::CloseLead => "leads:close",
            Permission::ViewClosedLeads => "leads:view_closed",
            Permission::SubmitQuoteRequest => "quotes:submit",
            Permission::WorkQuoteRequests => "quotes:work",
            Permission::ViewQuoteRequests => "quotes:read",
            Permission::ViewDeals => "deals:read",
            Permission::CreateDeal => "deals:create",
            Permission::EditDeal => "deals:edit",
            Permission::FilterDealsBySalesRep => "deals:filter_by_rep",
        }
    }
}

/// A tabela de permissões.
pub fn allows(role: Role, permission: Permission) -> bool {
    use Permission::*;
    use Role::*;

    match permission {
        CreateLead | EditLead => matches!(role, Admin | SalesManager | SalesRep | LeadAssigner),
        ReassignLead => matches!(role, Admin | LeadAssigner),
        CloseLead => matches!(role, Admin | SalesManager),
        ViewClosedLeads => matches!(role, Admin | Viewer),
        SubmitQuoteRequest => matches!(role, Admin | SalesManager | SalesRep),
        WorkQuoteRequests => matches!(role, Admin | QuoteMaker),
        ViewQuoteRequests => matches!(role, Admin | QuoteMaker | Viewer),
        ViewDeals => matches!(role, Admin | SalesManager | SalesRep | Viewer),
        CreateDeal => matches!(role, Admin | SalesManager),
        EditDeal | FilterDealsBySalesRep => matches!(role, Admin),
    }
}

pub fn authorize(role: Role, permission: Permission) -> Result<(), AppError> {
    if allows(role, permission) {
        Ok(())
    } else {
        tracing::warn!(
            "Acesso negado: cargo '{}' sem a permissão '{}'",
            role.as_str(),
            permission.slug()
        );
        Err(AppError::forbidden(format!(
            "Your role ({}) is not allowed to perform '{}'.",
            role.as_str(),
            permission.slug()
        )))
    }
}

/// Mudança de status de um lead. Entrar em won/lost exige CloseLead;
/// continuar em won/lost é sempre permitido.
pub fn check_lead_status_change(
    role: Role,
    from: LeadStatus,
    to: LeadStatus,
) -> Result<(), AppError> {
    if to.is_closed() && from != to && !allows(role, Permission::CloseLead) {
        tracing::warn!(
            "Transição negada: {} -> {} pelo cargo '{}'",
            from.as_str(),
            to.as_str(),
            role.as_str()
        );
        return Err(AppError::forbidden(format!(
            "Only admins and sales managers can mark a lead as {}.",
            to.as_str()
        )));
    }
    Ok(())
}

/// Troca de vendedor responsável. Reenviar o mesmo vendedor não é troca.
pub fn check_reassignment(
    role: Role,
    lead_id: Uuid,
    current: Option<Uuid>,
    requested: Option<Uuid>,
) -> Result<(), AppError> {
    let changes = requested.is_some() && requested != current;
    if changes && !allows(role, Permission::ReassignLead) {
        return Err(AppError::forbidden(format!(
            "Cannot reassign lead {}: only admins and lead assigners can change lead assignments.",
            lead_id
        )));
    }
    Ok(())
}

/// Vendedores só mexem nos leads atribuídos a eles.
pub fn check_lead_ownership(
    role: Role,
    user_id: Uuid,
    lead_id: Uuid,
    assignee: Option<Uuid>,
) -> Result<(), AppError> {
    if role == Role::SalesRep && assignee != Some(user_id) {
        return Err(AppError::forbidden(format!(
            "Lead {} is not assigned to you.",
            lead_id
        )));
    }
    Ok(())
}

/// Vendedores só enxergam os próprios deals.
pub fn check_deal_visibility(role: Role, user_id: Uuid, sales_rep_id: Uuid) -> Result<(), AppError> {
    authorize(role, Permission::ViewDeals)?;
    if role == Role::SalesRep && sales_rep_id != user_id {
        return Err(AppError::forbidden("Insufficient permissions"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVILEGED: [Role; 2] = [Role::Admin, Role::SalesManager];
    const UNPRIVILEGED: [Role; 4] = [
        Role::SalesRep,
        Role::LeadAssigner,
        Role::QuoteMaker,
        Role::Viewer,
    ];
    const STATUSES: [LeadStatus; 6] = [
        LeadStatus::New,
        LeadStatus::QuoteMade,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
        LeadStatus::Unqualified,
    ];

    #[test]
    fn keeping_a_closed_lead_closed_is_allowed_for_every_role() {
        for role in Role::ALL {
            for status in [LeadStatus::Won, LeadStatus::Lost] {
                assert!(check_lead_status_change(role, status, status).is_ok());
            }
        }
    }

    #[test]
    fn closing_a_lead_requires_a_privileged_role() {
        for from in STATUSES {
            for to in [LeadStatus::Won, LeadStatus::Lost] {
                if from == to {
                    continue;
                }
                for role in PRIVILEGED {
                    assert!(check_lead_status_change(role, from, to).is_ok());
                }
                for role in UNPRIVILEGED {
                    let err = check_lead_status_change(role, from, to).unwrap_err();
                    assert!(matches!(err, AppError::Forbidden(_)));
                }
            }
        }
    }

    #[test]
    fn open_transitions_are_not_gated_by_close_permission() {
        for role in Role::ALL {
            assert!(
                check_lead_status_change(role, LeadStatus::New, LeadStatus::Negotiation).is_ok()
            );
            assert!(
                check_lead_status_change(role, LeadStatus::Won, LeadStatus::Negotiation).is_ok()
            );
        }
    }

    #[test]
    fn reassignment_is_limited_to_admins_and_lead_assigners() {
        let lead = Uuid::new_v4();
        let current = Some(Uuid::new_v4());
        let other = Some(Uuid::new_v4());

        assert!(check_reassignment(Role::Admin, lead, current, other).is_ok());
        assert!(check_reassignment(Role::LeadAssigner, lead, current, other).is_ok());

        let err = check_reassignment(Role::SalesManager, lead, current, other).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&lead.to_string()));
        assert!(message.contains("lead assigners"));
    }

    #[test]
    fn resending_the_current_assignee_is_not_a_reassignment() {
        let lead = Uuid::new_v4();
        let current = Some(Uuid::new_v4());
        for role in Role::ALL {
            assert!(check_reassignment(role, lead, current, current).is_ok());
            assert!(check_reassignment(role, lead, current, None).is_ok());
        }
    }

    #[test]
    fn sales_reps_only_touch_their_own_leads() {
        let me = Uuid::new_v4();
        let lead = Uuid::new_v4();
        assert!(check_lead_ownership(Role::SalesRep, me, lead, Some(me)).is_ok());
        assert!(check_lead_ownership(Role::SalesRep, me, lead, Some(Uuid::new_v4())).is_err());
        assert!(check_lead_ownership(Role::SalesRep, me, lead, None).is_err());
        assert!(check_lead_ownership(Role::SalesManager, me, lead, None).is_ok());
    }

    #[test]
    fn viewer_is_read_only() {
        for permission in [
            Permission::CreateLead,
            Permission::EditLead,
            Permission::ReassignLead,
            Permission::CloseLead,
            Permission::SubmitQuoteRequest,
            Permission::WorkQuoteRequests,
            Permission::CreateDeal,
            Permission::EditDeal,
        ] {
            assert!(!allows(Role::Viewer, permission), "{}", permission.slug());
        }
        assert!(allows(Role::Viewer, Permission::ViewDeals));
        assert!(allows(Role::Viewer, Permission::ViewQuoteRequests));
        assert!(allows(Role::Viewer, Permission::ViewClosedLeads));
    }

    #[test]
    fn quote_work_belongs_to_quote_makers_and_admins() {
        let workers: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|r| allows(*r, Permission::WorkQuoteRequests))
            .collect();
        assert_eq!(workers, vec![Role::Admin, Role::QuoteMaker]);
    }

    #[test]
    fn sales_reps_cannot_read_other_reps_deals() {
        let me = Uuid::new_v4();
        assert!(check_deal_visibility(Role::SalesRep, me, me).is_ok());
        assert!(check_deal_visibility(Role::SalesRep, me, Uuid::new_v4()).is_err());
        assert!(check_deal_visibility(Role::Viewer, me, Uuid::new_v4()).is_ok());
        assert!(check_deal_visibility(Role::QuoteMaker, me, me).is_err());
    }
}
