// src/db/quote_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::quote::{QuoteRequest, QuoteRequestDetail, QuoteRequestStatus, QuoteType},
    services::filters::{DateRange, contains_pattern},
};

const QUOTE_COLUMNS: &str = r#"
    q.id, q.lead_id, q.sales_rep_id, q.quote_maker_id, q.requested_at, q.quoted_at,
    q.status, q.quote_value, q.type
"#;

/// Filtros da listagem de pedidos de orçamento, já interpretados.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteRequestFilter {
    pub sales_rep_id: Option<Uuid>,
    pub quote_type: Option<QuoteType>,
    pub quoted_between: Option<DateRange>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct QuoteRepository {
    pool: PgPool,
}

impl QuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        sales_rep_id: Uuid,
        quote_type: QuoteType,
    ) -> Result<QuoteRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, QuoteRequest>(&format!(
            r#"
            INSERT INTO quote_requests AS q (lead_id, sales_rep_id, status, quote_value, type)
            VALUES ($1, $2, 'pending', 0, $3)
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(sales_rep_id)
        .bind(quote_type)
        .fetch_one(executor)
        .await?;

        Ok(request)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<QuoteRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, QuoteRequest>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote_requests q WHERE q.id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    /// pending -> active. Devolve None se o pedido não estava mais pendente.
    pub async fn claim<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quote_maker_id: Uuid,
    ) -> Result<Option<QuoteRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, QuoteRequest>(&format!(
            r#"
            UPDATE quote_requests AS q
            SET status = 'active', quote_maker_id = $2
            WHERE q.id = $1 AND q.status = 'pending'
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(quote_maker_id)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    /// active -> completed. Devolve None se o pedido não estava ativo.
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quote_maker_id: Uuid,
        quote_value: Decimal,
        quote_type: QuoteType,
    ) -> Result<Option<QuoteRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, QuoteRequest>(&format!(
            r#"
            UPDATE quote_requests AS q
            SET status = 'completed',
                quote_value = $3,
                quoted_at = now(),
                quote_maker_id = $2,
                type = $4
            WHERE q.id = $1 AND q.status = 'active'
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(quote_maker_id)
        .bind(quote_value)
        .bind(quote_type)
        .fetch_optional(executor)
        .await?;

        Ok(request)
    }

    pub async fn list(&self, filter: &QuoteRequestFilter) -> Result<Vec<QuoteRequestDetail>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            r#"
            SELECT {QUOTE_COLUMNS},
                l.name AS lead_name,
                l.address AS lead_address,
                l.property_type AS lead_property_type,
                l.quote_number,
                sr.full_name AS sales_rep_name,
                qm.full_name AS quote_maker_name
            FROM quote_requests q
            JOIN leads l ON l.id = q.lead_id
            LEFT JOIN users sr ON sr.id = q.sales_rep_id
            LEFT JOIN users qm ON qm.id = q.quote_maker_id
            WHERE TRUE
            "#
        ));

        if let Some(sales_rep_id) = filter.sales_rep_id {
            builder.push(" AND q.sales_rep_id = ").push_bind(sales_rep_id);
        }
        if let Some(quote_type) = filter.quote_type {
            builder.push(" AND q.type = ").push_bind(quote_type);
        }
        if let Some(range) = filter.quoted_between {
            builder
                .push(" AND q.quoted_at >= ")
                .push_bind(range.start)
                .push("::date AND q.quoted_at < ")
                .push_bind(range.end)
                .push("::date");
        }
        if let Some(term) = &filter.search {
            let pattern = contains_pattern(term);
            builder
                .push(" AND (l.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.address ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder.push(format!(
            " ORDER BY CASE q.status WHEN 'pending' THEN {} WHEN 'active' THEN {} ELSE {} END, q.requested_at ASC, q.id ASC",
            QuoteRequestStatus::Pending.ordinal(),
            QuoteRequestStatus::Active.ordinal(),
            QuoteRequestStatus::Completed.ordinal(),
        ));

        let requests = builder
            .build_query_as::<QuoteRequestDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }
}
