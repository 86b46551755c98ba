// src/models/dashboard.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::lead::LeadSource;

// 1. Cards do topo
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_leads: i64,
    pub total_deals: i64,
    pub total_revenue: Decimal,
    pub conversion_rate: f64,
}

// 2. Barras mensais (Jan..Dez)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyOrdersEntry {
    #[schema(example = "Jan")]
    pub month: String,
    pub total_value: Decimal,
    pub amount_in: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEntry {
    #[schema(example = "Jan")]
    pub month: String,
    pub expected_cash_flow: Decimal,
}

// 3. Rosca (nome / valor)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryShare {
    #[schema(example = "Social Media")]
    pub name: String,
    pub value: Decimal,
}

// --- Linhas cruas lidas do banco para agregação ---

#[derive(Debug, Clone, FromRow)]
pub struct DatedOrderRow {
    pub order_date: NaiveDate,
    pub total_value: Decimal,
    pub amount_in: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct CashFlowRow {
    pub final_size_date: Option<NaiveDate>,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct LeadSourceRow {
    pub lead_found_through: Option<LeadSource>,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct SalesPersonRow {
    pub full_name: Option<String>,
    pub total_value: Decimal,
}

// --- PARÂMETROS ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartYearParams {
    /// Ano (ex: 2026); ausente ou inválido usa o ano corrente
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChartMonthParams {
    /// Mês no formato YYYY-MM; ausente ou inválido usa o mês corrente
    pub month: Option<String>,
}
