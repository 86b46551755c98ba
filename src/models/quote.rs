// src/models/quote.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::lead::PropertyType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quote_request_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuoteRequestStatus {
    Pending,
    Active,
    Completed,
}

impl QuoteRequestStatus {
    /// O fluxo é linear: pending -> active -> completed. Completed é terminal.
    pub fn can_transition_to(self, next: QuoteRequestStatus) -> bool {
        matches!(
            (self, next),
            (QuoteRequestStatus::Pending, QuoteRequestStatus::Active)
                | (QuoteRequestStatus::Active, QuoteRequestStatus::Completed)
        )
    }

    pub fn ordinal(self) -> i32 {
        match self {
            QuoteRequestStatus::Pending => 1,
            QuoteRequestStatus::Active => 2,
            QuoteRequestStatus::Completed => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteRequestStatus::Pending => "pending",
            QuoteRequestStatus::Active => "active",
            QuoteRequestStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "quote_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuoteType {
    #[default]
    Fresh,
    Revisal,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub sales_rep_id: Uuid,
    pub quote_maker_id: Option<Uuid>,
    pub requested_at: DateTime<Utc>,
    pub quoted_at: Option<DateTime<Utc>>,
    pub status: QuoteRequestStatus,
    #[schema(example = 0.0)]
    pub quote_value: Decimal,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub quote_type: QuoteType,
}

// Linha da listagem, já com os dados do lead e os nomes dos usuários
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: QuoteRequest,
    pub lead_name: String,
    pub lead_address: String,
    pub lead_property_type: PropertyType,
    pub quote_number: Option<String>,
    pub sales_rep_name: Option<String>,
    pub quote_maker_name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestCounts {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
}

impl QuoteRequestCounts {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a QuoteRequestStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                QuoteRequestStatus::Pending => counts.pending += 1,
                QuoteRequestStatus::Active => counts.active += 1,
                QuoteRequestStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestBoard {
    pub counts: QuoteRequestCounts,
    pub items: Vec<QuoteRequestDetail>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuoteRequestPayload {
    pub lead_id: Uuid,
    #[serde(rename = "type", default)]
    pub quote_type: QuoteType,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartQuotePayload {
    pub lead_id: Uuid,
    #[serde(default)]
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Q-2041")]
    pub quote_number: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuotePayload {
    pub lead_id: Uuid,
    #[schema(example = 1500.0)]
    pub quote_value: Decimal,
    #[serde(rename = "type", default)]
    pub quote_type: QuoteType,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct QuoteRequestListParams {
    pub sales_person_id: Option<String>,
    /// fresh | revisal | all
    pub quote_type: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [QuoteRequestStatus; 3] = [
        QuoteRequestStatus::Pending,
        QuoteRequestStatus::Active,
        QuoteRequestStatus::Completed,
    ];

    #[test]
    fn only_forward_single_steps_are_allowed() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (QuoteRequestStatus::Pending, QuoteRequestStatus::Active),
                (QuoteRequestStatus::Active, QuoteRequestStatus::Completed),
            ]
        );
    }

    #[test]
    fn completed_is_terminal() {
        for next in ALL {
            assert!(!QuoteRequestStatus::Completed.can_transition_to(next));
        }
    }

    #[test]
    fn tally_counts_each_status() {
        let statuses = [
            QuoteRequestStatus::Pending,
            QuoteRequestStatus::Completed,
            QuoteRequestStatus::Pending,
            QuoteRequestStatus::Active,
        ];
        let counts = QuoteRequestCounts::tally(statuses.iter());
        assert_eq!(
            counts,
            QuoteRequestCounts {
                pending: 2,
                active: 1,
                completed: 1
            }
        );
    }
}
