// src/models/deal.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::error::AppError;

use crate::models::lead::PropertyType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Active,
    Completed,
}

// O "deal". total_value é coluna gerada no banco, só leitura para nós.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub sales_rep_id: Uuid,
    #[schema(example = 10000.0)]
    pub amount_in: Decimal,
    #[schema(example = 800.0)]
    pub tax_amount: Decimal,
    #[schema(example = 500.0)]
    pub middleman_cut: Decimal,
    #[schema(example = 11300.0)]
    pub total_value: Decimal,
    #[schema(value_type = String, format = Date, example = "2026-02-14")]
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    // A coluna mantém a grafia do banco
    #[sqlx(rename = "amount_recieved")]
    pub amount_received: Decimal,
    #[schema(value_type = Option<String>, format = Date)]
    pub final_size_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub lead_name: Option<String>,
    pub lead_address: Option<String>,
    pub lead_property_type: Option<PropertyType>,
    pub sales_rep_name: Option<String>,
}

// Cards de resumo da página de deals
#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealStats {
    pub count: usize,
    pub total_value: Decimal,
    pub total_amount_in: Decimal,
    pub total_received: Decimal,
}

impl DealStats {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders.into_iter().fold(Self::default(), |mut acc, order| {
            acc.count += 1;
            acc.total_value += order.total_value;
            acc.total_amount_in += order.amount_in;
            acc.total_received += order.amount_received;
            acc
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DealList {
    pub stats: DealStats,
    pub items: Vec<OrderDetail>,
}

// Campos de um deal que podem ser alterados; None = não mexe,
// Some(None) = limpa a coluna
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub amount_in: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub middleman_cut: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub notes: Option<Option<String>>,
    pub amount_received: Option<Decimal>,
    pub final_size_date: Option<Option<NaiveDate>>,
    pub order_date: Option<NaiveDate>,
}

impl OrderPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn non_negative(field: &str, value: Option<Decimal>) -> Result<Option<Decimal>, AppError> {
    match value {
        Some(v) if v < Decimal::ZERO => {
            Err(AppError::invalid(format!("{} must be zero or greater", field)))
        }
        other => Ok(other),
    }
}

// Campo ausente -> None; `null` explícito -> Some(None)
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// --- PAYLOADS ---

// Marca o lead como ganho e abre o deal
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealPayload {
    pub lead_id: Uuid,
    #[schema(example = 10000.0)]
    pub amount_in: Decimal,
    #[serde(default)]
    #[schema(example = 800.0)]
    pub tax_amount: Decimal,
    #[serde(default)]
    #[schema(example = 500.0)]
    pub middleman_cut: Decimal,
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub final_size_date: Option<NaiveDate>,
}

impl CreateDealPayload {
    pub fn check_amounts(&self) -> Result<(), AppError> {
        non_negative("amountIn", Some(self.amount_in))?;
        non_negative("taxAmount", Some(self.tax_amount))?;
        non_negative("middlemanCut", Some(self.middleman_cut))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDealPayload {
    pub amount_in: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub middleman_cut: Option<Decimal>,
    pub status: Option<OrderStatus>,
    /// `null` apaga as observações
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    pub amount_received: Option<Decimal>,
    /// `null` apaga a data da medição final
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub final_size_date: Option<Option<NaiveDate>>,
    #[schema(value_type = Option<String>, format = Date)]
    pub order_date: Option<NaiveDate>,
}

impl UpdateDealPayload {
    /// Valores não podem ser negativos e o patch não pode vir vazio.
    pub fn into_patch(self) -> Result<OrderPatch, AppError> {
        let patch = OrderPatch {
            amount_in: non_negative("amountIn", self.amount_in)?,
            tax_amount: non_negative("taxAmount", self.tax_amount)?,
            middleman_cut: non_negative("middlemanCut", self.middleman_cut)?,
            status: self.status,
            notes: self.notes,
            amount_received: non_negative("amountReceived", self.amount_received)?,
            final_size_date: self.final_size_date,
            order_date: self.order_date,
        };

        if patch.is_empty() {
            return Err(AppError::invalid("No fields to update"));
        }
        Ok(patch)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DealListParams {
    /// Só para administradores
    pub sales_person_id: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn order(total: Decimal, amount_in: Decimal, received: Decimal) -> Order {
        Order {
            id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            sales_rep_id: Uuid::new_v4(),
            amount_in,
            tax_amount: Decimal::ZERO,
            middleman_cut: total - amount_in,
            total_value: total,
            order_date: NaiveDate::from_ymd_opt(2026, 2, 14).unwrap(),
            status: OrderStatus::Pending,
            amount_received: received,
            final_size_date: None,
            notes: None,
        }
    }

    #[test]
    fn stats_sum_exactly_the_listed_rows() {
        let orders = [
            order(d("1000"), d("900"), d("100")),
            order(d("250.50"), d("200"), d("0")),
        ];
        let stats = DealStats::from_orders(orders.iter());
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_value, d("1250.50"));
        assert_eq!(stats.total_amount_in, d("1100"));
        assert_eq!(stats.total_received, d("100"));
        assert_eq!(DealStats::from_orders(std::iter::empty()), DealStats::default());
    }

    #[test]
    fn empty_patch_is_rejected() {
        let err = UpdateDealPayload::default().into_patch().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let payload = UpdateDealPayload {
            tax_amount: Some(d("-1")),
            ..UpdateDealPayload::default()
        };
        assert!(payload.into_patch().is_err());
    }

    #[test]
    fn patch_keeps_only_supplied_fields() {
        let payload = UpdateDealPayload {
            amount_received: Some(d("0")),
            status: Some(OrderStatus::Active),
            ..UpdateDealPayload::default()
        };
        let patch = payload.into_patch().unwrap();
        assert_eq!(patch.amount_received, Some(Decimal::ZERO));
        assert_eq!(patch.status, Some(OrderStatus::Active));
        assert_eq!(patch.amount_in, None);
        assert_eq!(patch.notes, None);
    }

    #[test]
    fn explicit_null_clears_while_missing_keeps() {
        let clear: UpdateDealPayload =
            serde_json::from_str(r#"{"notes": null, "finalSizeDate": null}"#).unwrap();
        let patch = clear.into_patch().unwrap();
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.final_size_date, Some(None));

        let set: UpdateDealPayload =
            serde_json::from_str(r#"{"notes": "call back", "finalSizeDate": "2026-03-01"}"#).unwrap();
        assert_eq!(set.notes, Some(Some("call back".to_string())));
        assert_eq!(
            set.final_size_date,
            Some(NaiveDate::from_ymd_opt(2026, 3, 1))
        );

        let untouched: UpdateDealPayload = serde_json::from_str(r#"{"status": "active"}"#).unwrap();
        assert_eq!(untouched.notes, None);
        assert_eq!(untouched.final_size_date, None);
    }
}
