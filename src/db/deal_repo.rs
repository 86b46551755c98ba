// src/db/deal_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::deal::{Order, OrderDetail, OrderPatch},
    services::filters::{DealDateFilter, DealQuery},
};

const ORDER_COLUMNS: &str = r#"
    o.id, o.lead_id, o.sales_rep_id, o.amount_in, o.tax_amount, o.middleman_cut,
    o.total_value, o.order_date, o.status, o.amount_recieved, o.final_size_date, o.notes
"#;

const DETAIL_JOINS: &str = r#"
    FROM orders o
    LEFT JOIN leads l ON l.id = o.lead_id
    LEFT JOIN users u ON u.id = o.sales_rep_id
"#;

const DETAIL_COLUMNS: &str = r#"
    l.name AS lead_name,
    l.address AS lead_address,
    l.property_type AS lead_property_type,
    u.full_name AS sales_rep_name
"#;

#[derive(Clone)]
pub struct DealRepository {
    pool: PgPool,
}

impl DealRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Novo deal: pendente, datado de hoje. total_value fica por conta do banco.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        sales_rep_id: Uuid,
        amount_in: Decimal,
        tax_amount: Decimal,
        middleman_cut: Decimal,
        notes: Option<&str>,
        final_size_date: Option<chrono::NaiveDate>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders AS o (
                lead_id, sales_rep_id, amount_in, tax_amount, middleman_cut,
                status, order_date, notes, final_size_date
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', CURRENT_DATE, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(lead_id)
        .bind(sales_rep_id)
        .bind(amount_in)
        .bind(tax_amount)
        .bind(middleman_cut)
        .bind(notes)
        .bind(final_size_date)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, format!("Lead {} already has a deal", lead_id)))?;

        Ok(order)
    }

    pub async fn exists_for_lead<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE lead_id = $1)",
        )
        .bind(lead_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let order = sqlx::query_as::<_, OrderDetail>(&format!(
            "SELECT {ORDER_COLUMNS}, {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Escreve só os campos presentes no patch; `Some(None)` grava NULL.
    pub async fn update(&self, id: Uuid, patch: &OrderPatch) -> Result<Option<Order>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE orders AS o SET ");
        let mut set = builder.separated(", ");

        if let Some(v) = patch.amount_in {
            set.push("amount_in = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.tax_amount {
            set.push("tax_amount = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.middleman_cut {
            set.push("middleman_cut = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.status {
            set.push("status = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.notes {
            set.push("notes = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.amount_received {
            set.push("amount_recieved = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.final_size_date {
            set.push("final_size_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.order_date {
            set.push("order_date = ").push_bind_unseparated(v);
        }

        builder
            .push(" WHERE o.id = ")
            .push_bind(id)
            .push(format!(" RETURNING {ORDER_COLUMNS}"));

        let order = builder
            .build_query_as::<Order>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &DealQuery) {
        builder.push(" WHERE TRUE");

        if let Some(sales_rep_id) = query.sales_rep_id {
            builder.push(" AND o.sales_rep_id = ").push_bind(sales_rep_id);
        }
        match query.date {
            DealDateFilter::Any => {}
            DealDateFilter::Range(range) => {
                builder
                    .push(" AND o.order_date >= ")
                    .push_bind(range.start)
                    .push(" AND o.order_date < ")
                    .push_bind(range.end);
            }
            DealDateFilter::MonthOfAnyYear(month) => {
                builder
                    .push(" AND EXTRACT(MONTH FROM o.order_date) = ")
                    .push_bind(month as i32);
            }
        }
    }

    pub async fn list(&self, query: &DealQuery) -> Result<Vec<OrderDetail>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ORDER_COLUMNS}, {DETAIL_COLUMNS} {DETAIL_JOINS}"
        ));
        Self::push_filters(&mut builder, query);
        builder.push(" ORDER BY o.order_date DESC, o.id ASC");

        let orders = builder
            .build_query_as::<OrderDetail>()
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }
}
