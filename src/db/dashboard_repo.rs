// src/db/dashboard_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::dashboard::{CashFlowRow, DatedOrderRow, LeadSourceRow, SalesPersonRow},
    services::filters::DateRange,
};

// Linhas cruas para os gráficos; a agregação fica no serviço
#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Deals por data do pedido
    pub async fn orders_between(&self, range: DateRange) -> Result<Vec<DatedOrderRow>, AppError> {
        let rows = sqlx::query_as::<_, DatedOrderRow>(
            r#"
            SELECT order_date, total_value, amount_in
            FROM orders
            WHERE order_date >= $1 AND order_date < $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // 2. Deals por data de medição final (sem data ficam de fora)
    pub async fn final_sizes_between(&self, range: DateRange) -> Result<Vec<CashFlowRow>, AppError> {
        let rows = sqlx::query_as::<_, CashFlowRow>(
            r#"
            SELECT final_size_date, total_value
            FROM orders
            WHERE final_size_date IS NOT NULL
              AND final_size_date >= $1 AND final_size_date < $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // 3. Valor dos deals com a origem do lead
    pub async fn lead_sources_between(&self, range: DateRange) -> Result<Vec<LeadSourceRow>, AppError> {
        let rows = sqlx::query_as::<_, LeadSourceRow>(
            r#"
            SELECT l.lead_found_through, o.total_value
            FROM orders o
            LEFT JOIN leads l ON l.id = o.lead_id
            WHERE o.order_date >= $1 AND o.order_date < $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // 4. Valor dos deals com o nome do vendedor
    pub async fn sales_people_between(&self, range: DateRange) -> Result<Vec<SalesPersonRow>, AppError> {
        let rows = sqlx::query_as::<_, SalesPersonRow>(
            r#"
            SELECT u.full_name, o.total_value
            FROM orders o
            LEFT JOIN users u ON u.id = o.sales_rep_id
            WHERE o.order_date >= $1 AND o.order_date < $2
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
