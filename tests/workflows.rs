use std::collections::BTreeSet;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use leadink::{
    common::error::AppError,
    config::AppState,
    models::{
        auth::{CurrentUser, Role},
        deal::{CreateDealPayload, DealListParams},
        lead::{LeadListParams, LeadPayload, LeadSource, LeadStatus, PropertyType},
        quote::{
            CompleteQuotePayload, QuoteRequestStatus, QuoteType, StartQuotePayload,
            SubmitQuoteRequestPayload,
        },
    },
};

fn state(pool: &PgPool) -> AppState {
    AppState::from_pool(pool.clone(), "test-secret".to_string())
}

async fn user(pool: &PgPool, name: &str, role: Role) -> CurrentUser {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, full_name, role) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
    CurrentUser {
        id,
        full_name: name.to_string(),
        role,
    }
}

fn lead_payload(name: &str, assignee: Option<Uuid>) -> LeadPayload {
    LeadPayload {
        name: name.to_string(),
        address: "12 Harbor Road".into(),
        property_type: Some(PropertyType::Residential),
        phone_number: "+1 555 0100".into(),
        lead_found_through: Some(LeadSource::Scanner),
        assigned_user_id: assignee,
        ..LeadPayload::default()
    }
}

async fn new_lead(app: &AppState, admin: &CurrentUser, name: &str, assignee: Uuid) -> Uuid {
    app.lead_service
        .create_lead(admin, &lead_payload(name, Some(assignee)))
        .await
        .unwrap()
        .lead
        .id
}

fn d(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn deal(lead_id: Uuid, amount_in: &str) -> CreateDealPayload {
    CreateDealPayload {
        lead_id,
        amount_in: d(amount_in),
        tax_amount: d("100"),
        middleman_cut: d("50"),
        notes: None,
        final_size_date: None,
    }
}

async fn quote_request_count(pool: &PgPool, lead_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM quote_requests WHERE lead_id = $1")
        .bind(lead_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn submit_for_unassigned_lead_creates_nothing(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;

    let lead_id: Uuid = sqlx::query_scalar(
        "INSERT INTO leads (name, address, property_type, phone_number, lead_found_through)
         VALUES ('Orphan', '1 Elm St', 'commercial', '555', 'sunny') RETURNING id",
    )
    .fetch_one(&pool)
    .await
    .unwrap();

    let err = app
        .quote_service
        .submit(
            &admin,
            &SubmitQuoteRequestPayload {
                lead_id,
                quote_type: QuoteType::Fresh,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::LeadNotAssigned(id) if id == lead_id));
    assert_eq!(quote_request_count(&pool, lead_id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn quote_request_runs_pending_active_completed(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;

    // Vendedor com 3 leads, 1 ganho
    let won = new_lead(&app, &admin, "Won House", rep.id).await;
    let target = new_lead(&app, &admin, "Oak House", rep.id).await;
    new_lead(&app, &admin, "Pine House", rep.id).await;
    app.deal_service.create_deal(&admin, &deal(won, "1000")).await.unwrap();

    let request = app
        .quote_service
        .submit(
            &rep,
            &SubmitQuoteRequestPayload {
                lead_id: target,
                quote_type: QuoteType::Fresh,
            },
        )
        .await
        .unwrap();
    assert_eq!(request.status, QuoteRequestStatus::Pending);
    assert_eq!(request.sales_rep_id, rep.id);
    assert_eq!(request.quote_value, Decimal::ZERO);

    app.quote_service
        .start(
            &admin,
            request.id,
            &StartQuotePayload {
                lead_id: target,
                quote_number: "Q-2041".into(),
            },
        )
        .await
        .unwrap();

    let completed = app
        .quote_service
        .complete(
            &admin,
            request.id,
            &CompleteQuotePayload {
                lead_id: target,
                quote_value: d("1500"),
                quote_type: QuoteType::Fresh,
            },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, QuoteRequestStatus::Completed);
    assert!(completed.quoted_at.is_some());

    let lead = app.lead_service.get_lead(&admin, target).await.unwrap().lead;
    assert_eq!(lead.status, LeadStatus::QuoteMade);
    assert_eq!(lead.quote_value, d("1500"));
    assert_eq!(lead.quote_number.as_deref(), Some("Q-2041"));
}

#[sqlx::test(migrations = "./migrations")]
async fn out_of_order_steps_leave_the_request_untouched(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let maker = user(&pool, "Quinn Maker", Role::QuoteMaker).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;
    let lead_id = new_lead(&app, &admin, "Oak House", rep.id).await;

    let request = app
        .quote_service
        .submit(
            &rep,
            &SubmitQuoteRequestPayload {
                lead_id,
                quote_type: QuoteType::Fresh,
            },
        )
        .await
        .unwrap();

    let complete = CompleteQuotePayload {
        lead_id,
        quote_value: d("1500"),
        quote_type: QuoteType::Revisal,
    };
    let err = app
        .quote_service
        .complete(&maker, request.id, &complete)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let (status, value, quoted_at): (QuoteRequestStatus, Decimal, Option<chrono::DateTime<chrono::Utc>>) =
        sqlx::query_as("SELECT status, quote_value, quoted_at FROM quote_requests WHERE id = $1")
            .bind(request.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, QuoteRequestStatus::Pending);
    assert_eq!(value, Decimal::ZERO);
    assert!(quoted_at.is_none());

    let start = StartQuotePayload {
        lead_id,
        quote_number: "Q-1".into(),
    };
    app.quote_service.start(&maker, request.id, &start).await.unwrap();
    let err = app
        .quote_service
        .start(&admin, request.id, &start)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let (status, claimed_by): (QuoteRequestStatus, Option<Uuid>) =
        sqlx::query_as("SELECT status, quote_maker_id FROM quote_requests WHERE id = $1")
            .bind(request.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, QuoteRequestStatus::Active);
    assert_eq!(claimed_by, Some(maker.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn pages_concatenate_to_the_unpaged_set(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;

    for i in 0..40 {
        new_lead(&app, &admin, &format!("Oak House {}", i), rep.id).await;
    }
    for i in 0..20 {
        new_lead(&app, &admin, &format!("Pine House {}", i), rep.id).await;
    }

    let expected: BTreeSet<Uuid> =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM leads WHERE name ILIKE '%oak%'")
            .fetch_all(&pool)
            .await
            .unwrap()
            .into_iter()
            .collect();
    assert_eq!(expected.len(), 40);

    let mut seen = Vec::new();
    let mut page = 1;
    loop {
        let params = LeadListParams {
            search: Some("oak".into()),
            page: Some(page),
            ..LeadListParams::default()
        };
        let result = app.lead_service.list_leads(&rep, &params).await.unwrap();
        assert_eq!(result.total, 40);
        seen.extend(result.items.iter().map(|l| l.lead.id));
        if !result.has_more {
            break;
        }
        page += 1;
    }

    assert_eq!(page, 2);
    assert_eq!(seen.len(), 40);
    assert_eq!(seen.into_iter().collect::<BTreeSet<_>>(), expected);
}

#[sqlx::test(migrations = "./migrations")]
async fn dashboard_revenue_matches_the_deal_list_for_every_role(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let manager = user(&pool, "Mona Manager", Role::SalesManager).await;
    let viewer = user(&pool, "Vic Viewer", Role::Viewer).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;
    let other_rep = user(&pool, "Otto Rep", Role::SalesRep).await;

    let won = new_lead(&app, &admin, "Won House", rep.id).await;
    new_lead(&app, &admin, "Oak House", rep.id).await;
    new_lead(&app, &admin, "Pine House", rep.id).await;
    let other = new_lead(&app, &admin, "Elm House", other_rep.id).await;

    app.deal_service.create_deal(&admin, &deal(won, "1000")).await.unwrap();
    app.deal_service.create_deal(&manager, &deal(other, "2500.50")).await.unwrap();

    for who in [&admin, &manager, &viewer, &rep, &other_rep] {
        let deals = app
            .deal_service
            .list_deals(who, &DealListParams::default())
            .await
            .unwrap();
        let summary = app.dashboard_service.summary(who).await.unwrap();
        assert_eq!(summary.total_revenue, deals.stats.total_value, "{:?}", who.role);
        assert_eq!(summary.total_deals, deals.stats.count as i64, "{:?}", who.role);
    }

    // 3 leads, 1 ganho, 1 deal
    let summary = app.dashboard_service.summary(&rep).await.unwrap();
    assert_eq!(summary.total_leads, 3);
    assert_eq!(summary.total_deals, 1);
    assert_eq!(summary.total_revenue, d("1150"));
    assert!((summary.conversion_rate - 100.0 / 3.0).abs() < 1e-9);
}

#[sqlx::test(migrations = "./migrations")]
async fn reassignment_replaces_the_single_assignment(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let assigner = user(&pool, "Lia Assigner", Role::LeadAssigner).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;
    let other_rep = user(&pool, "Otto Rep", Role::SalesRep).await;
    let lead_id = new_lead(&app, &admin, "Oak House", rep.id).await;

    // Vendedor não pode trocar o responsável
    let err = app
        .lead_service
        .update_lead(&rep, lead_id, &lead_payload("Oak House", Some(other_rep.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let updated = app
        .lead_service
        .update_lead(&assigner, lead_id, &lead_payload("Oak House", Some(other_rep.id)))
        .await
        .unwrap();
    assert_eq!(updated.assigned_to_user_id, Some(other_rep.id));

    let rows: Vec<Uuid> =
        sqlx::query_scalar("SELECT user_id FROM lead_assignments WHERE lead_id = $1")
            .bind(lead_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(rows, vec![other_rep.id]);

    let old_owner = app
        .lead_service
        .assignments_for_user(&rep, rep.id)
        .await
        .unwrap();
    assert!(old_owner.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn deal_patch_can_clear_notes(pool: PgPool) {
    let app = state(&pool);
    let admin = user(&pool, "Admin", Role::Admin).await;
    let rep = user(&pool, "Rita Rep", Role::SalesRep).await;
    let lead_id = new_lead(&app, &admin, "Oak House", rep.id).await;

    let order = app
        .deal_service
        .create_deal(
            &admin,
            &CreateDealPayload {
                notes: Some("deposit pending".into()),
                ..deal(lead_id, "1000")
            },
        )
        .await
        .unwrap();
    assert_eq!(order.notes.as_deref(), Some("deposit pending"));
    assert_eq!(order.total_value, d("1150"));

    let patch = serde_json::from_str(r#"{"notes": null, "amountReceived": 300}"#).unwrap();
    let updated = app
        .deal_service
        .update_deal(&admin, order.id, patch)
        .await
        .unwrap();
    assert_eq!(updated.notes, None);
    assert_eq!(updated.amount_received, d("300"));
    assert_eq!(updated.total_value, d("1150"));
}
