// src/db/lead_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_fk_violation, error::AppError},
    models::lead::{Lead, LeadAssignment, LeadFields, LeadStatus, LeadWithAssignment},
    services::filters::{LeadQuery, Pagination, contains_pattern},
};

const LEAD_COLUMNS: &str = r#"
    l.id, l.name, l.address, l.property_type, l.company, l.architect_name,
    l.phone_number, l.lead_found_through, l.status, l.quote_value, l.quote_number,
    l.notes, l.next_follow_up_date, l.lead_created_date
"#;

#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // =========================================================================
    //  LEADS
    // =========================================================================

    pub async fn create_lead<'e, E>(
        &self,
        executor: E,
        fields: &LeadFields,
        status: LeadStatus,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads AS l (
                name, address, property_type, company, architect_name, phone_number,
                lead_found_through, status, notes, next_follow_up_date, quote_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(fields.property_type)
        .bind(fields.company.as_deref())
        .bind(fields.architect_name.as_deref())
        .bind(&fields.phone_number)
        .bind(fields.lead_found_through)
        .bind(status)
        .bind(fields.notes.as_deref())
        .bind(fields.next_follow_up_date)
        .bind(fields.quote_number.as_deref())
        .fetch_one(executor)
        .await?;

        Ok(lead)
    }

    /// Busca o lead com o vendedor responsável. `for_update` trava a linha do lead
    /// até o fim da transação.
    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        for_update: bool,
    ) -> Result<Option<LeadWithAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lock = if for_update { "FOR UPDATE OF l" } else { "" };
        let lead = sqlx::query_as::<_, LeadWithAssignment>(&format!(
            r#"
            SELECT {LEAD_COLUMNS}, a.user_id AS assigned_to_user_id
            FROM leads l
            LEFT JOIN lead_assignments a ON a.lead_id = l.id
            WHERE l.id = $1
            {lock}
            "#
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(lead)
    }

    pub async fn update_lead<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        fields: &LeadFields,
        status: LeadStatus,
    ) -> Result<Lead, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lead = sqlx::query_as::<_, Lead>(&format!(
            r#"
            UPDATE leads AS l
            SET name = $2,
                address = $3,
                property_type = $4,
                company = $5,
                architect_name = $6,
                phone_number = $7,
                lead_found_through = $8,
                status = $9,
                notes = $10,
                next_follow_up_date = $11,
                quote_number = COALESCE($12, l.quote_number)
            WHERE l.id = $1
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.address)
        .bind(fields.property_type)
        .bind(fields.company.as_deref())
        .bind(fields.architect_name.as_deref())
        .bind(&fields.phone_number)
        .bind(fields.lead_found_through)
        .bind(status)
        .bind(fields.notes.as_deref())
        .bind(fields.next_follow_up_date)
        .bind(fields.quote_number.as_deref())
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;

        Ok(lead)
    }

    pub async fn set_status<'e, E>(&self, executor: E, id: Uuid, status: LeadStatus) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE leads SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    /// Início do orçamento: grava o número e move o lead para quote_made
    pub async fn start_quote<'e, E>(&self, executor: E, id: Uuid, quote_number: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE leads SET quote_number = $2, status = 'quote_made' WHERE id = $1",
        )
        .bind(id)
        .bind(quote_number)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    /// Orçamento concluído: copia o valor para o lead
    pub async fn apply_quote_value<'e, E>(&self, executor: E, id: Uuid, quote_value: Decimal) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE leads SET quote_value = $2, status = 'quote_made' WHERE id = $1",
        )
        .bind(id)
        .bind(quote_value)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    // =========================================================================
    //  LISTAGEM
    // =========================================================================

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &LeadQuery) {
        builder.push(" WHERE TRUE");

        if let Some(user_id) = query.assigned_to {
            builder.push(" AND a.user_id = ").push_bind(user_id);
        }
        if query.hide_closed {
            builder.push(" AND l.status NOT IN ('won', 'lost')");
        }
        if let Some(status) = query.status {
            builder.push(" AND l.status = ").push_bind(status);
        }
        if let Some(term) = &query.search {
            let pattern = contains_pattern(term);
            builder
                .push(" AND (l.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.address ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.phone_number ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR l.notes ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    pub async fn list_leads<'e, E>(
        &self,
        executor: E,
        query: &LeadQuery,
        pagination: Pagination,
    ) -> Result<Vec<LeadWithAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {LEAD_COLUMNS}, a.user_id AS assigned_to_user_id \
             FROM leads l LEFT JOIN lead_assignments a ON a.lead_id = l.id"
        ));
        Self::push_filters(&mut builder, query);
        builder.push(" ORDER BY ").push(query.sort.order_by_sql());

        builder
            .push(" LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let leads = builder
            .build_query_as::<LeadWithAssignment>()
            .fetch_all(executor)
            .await?;

        Ok(leads)
    }

    pub async fn count_leads<'e, E>(&self, executor: E, query: &LeadQuery) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM leads l LEFT JOIN lead_assignments a ON a.lead_id = l.id",
        );
        Self::push_filters(&mut builder, query);

        let total = builder.build_query_scalar::<i64>().fetch_one(executor).await?;

        Ok(total)
    }

    // =========================================================================
    //  ATRIBUIÇÕES
    // =========================================================================

    pub async fn find_assignment<'e, E>(&self, executor: E, lead_id: Uuid) -> Result<Option<LeadAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, LeadAssignment>(
            "SELECT lead_id, user_id, assigned_at FROM lead_assignments WHERE lead_id = $1",
        )
        .bind(lead_id)
        .fetch_optional(executor)
        .await?;

        Ok(assignment)
    }

    pub async fn list_assignments_for_user(&self, user_id: Uuid) -> Result<Vec<LeadAssignment>, AppError> {
        let assignments = sqlx::query_as::<_, LeadAssignment>(
            r#"
            SELECT lead_id, user_id, assigned_at
            FROM lead_assignments
            WHERE user_id = $1
            ORDER BY assigned_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignments)
    }

    /// Uma atribuição por lead: insere ou substitui numa única instrução
    pub async fn upsert_assignment<'e, E>(
        &self,
        executor: E,
        lead_id: Uuid,
        user_id: Uuid,
    ) -> Result<LeadAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assignment = sqlx::query_as::<_, LeadAssignment>(
            r#"
            INSERT INTO lead_assignments (lead_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (lead_id)
            DO UPDATE SET user_id = EXCLUDED.user_id, assigned_at = now()
            RETURNING lead_id, user_id, assigned_at
            "#,
        )
        .bind(lead_id)
        .bind(user_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_fk_violation(e, format!("User {} does not exist", user_id)))?;

        Ok(assignment)
    }
}
