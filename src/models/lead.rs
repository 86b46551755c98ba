// src/models/lead.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    QuoteMade,
    Negotiation,
    Won,
    Lost,
    Unqualified,
}

impl LeadStatus {
    /// Posição fixa do status no funil, usada na ordenação padrão.
    pub fn ordinal(self) -> i32 {
        match self {
            LeadStatus::New => 1,
            LeadStatus::QuoteMade => 2,
            LeadStatus::Negotiation => 3,
            LeadStatus::Won => 4,
            LeadStatus::Lost => 5,
            LeadStatus::Unqualified => 6,
        }
    }

    /// Won e Lost fecham o lead.
    pub fn is_closed(self) -> bool {
        matches!(self, LeadStatus::Won | LeadStatus::Lost)
    }

    /// Leads fechados ou desqualificados não recebem novos pedidos de orçamento.
    pub fn accepts_quote_requests(self) -> bool {
        !matches!(
            self,
            LeadStatus::Won | LeadStatus::Lost | LeadStatus::Unqualified
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::QuoteMade => "quote_made",
            LeadStatus::Negotiation => "negotiation",
            LeadStatus::Won => "won",
            LeadStatus::Lost => "lost",
            LeadStatus::Unqualified => "unqualified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "property_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Residential,
    Commercial,
}

// Por onde o lead chegou
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lead_source", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeadSource {
    Scanner,
    Sunny,
    SocialMedia,
    WordOfMouth,
    SocialMediaAds,
    Architect,
}

impl LeadSource {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Scanner => "scanner",
            LeadSource::Sunny => "sunny",
            LeadSource::SocialMedia => "social_media",
            LeadSource::WordOfMouth => "word_of_mouth",
            LeadSource::SocialMediaAds => "social_media_ads",
            LeadSource::Architect => "architect",
        }
    }
}

// --- LEAD ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    #[schema(example = "Maria Smith")]
    pub name: String,
    #[schema(example = "12 Harbor Road")]
    pub address: String,
    pub property_type: PropertyType,
    pub company: Option<String>,
    pub architect_name: Option<String>,
    #[schema(example = "+1 555 0100")]
    pub phone_number: String,
    pub lead_found_through: LeadSource,
    pub status: LeadStatus,
    #[schema(example = 1500.0)]
    pub quote_value: Decimal,
    #[schema(example = "Q-2041")]
    pub quote_number: Option<String>,
    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2026-03-01")]
    pub next_follow_up_date: Option<NaiveDate>,
    pub lead_created_date: DateTime<Utc>,
}

// Lead com o id do vendedor responsável (LEFT JOIN em lead_assignments)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadWithAssignment {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub lead: Lead,
    pub assigned_to_user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadAssignment {
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

// Página de leads (tamanho fixo, páginas começam em 1)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPage {
    pub items: Vec<LeadWithAssignment>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_more: bool,
}

// Campos editáveis de um lead, já validados pelo serviço
#[derive(Debug, Clone, PartialEq)]
pub struct LeadFields {
    pub name: String,
    pub address: String,
    pub property_type: PropertyType,
    pub company: Option<String>,
    pub architect_name: Option<String>,
    pub phone_number: String,
    pub lead_found_through: LeadSource,
    pub notes: Option<String>,
    pub next_follow_up_date: Option<NaiveDate>,
    pub quote_number: Option<String>,
}

// --- PAYLOADS ---

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// Corpo do POST /api/leads e do PUT /api/leads/{id}
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadPayload {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "Maria Smith")]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "12 Harbor Road")]
    pub address: String,

    #[validate(required(message = "required"))]
    pub property_type: Option<PropertyType>,

    pub company: Option<String>,
    pub architect_name: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    #[schema(example = "+1 555 0100")]
    pub phone_number: String,

    #[validate(required(message = "required"))]
    pub lead_found_through: Option<LeadSource>,

    pub notes: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "2026-03-01")]
    pub next_follow_up_date: Option<NaiveDate>,
    pub quote_number: Option<String>,

    // Criação: só "unqualified" é respeitado, o resto vira "new".
    // Edição: ausente mantém o status atual.
    pub status: Option<LeadStatus>,

    // Obrigatório na criação, exceto para leads desqualificados
    pub assigned_user_id: Option<Uuid>,
}

impl LeadPayload {
    /// Campos já normalizados (texto aparado, opcionais vazios viram None).
    pub fn to_fields(&self) -> Result<LeadFields, AppError> {
        let property_type = self
            .property_type
            .ok_or_else(|| AppError::invalid("propertyType is required"))?;
        let lead_found_through = self
            .lead_found_through
            .ok_or_else(|| AppError::invalid("leadFoundThrough is required"))?;

        Ok(LeadFields {
            name: self.name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            property_type,
            company: trimmed(self.company.clone()),
            architect_name: trimmed(self.architect_name.clone()),
            phone_number: self.phone_number.trim().to_owned(),
            lead_found_through,
            notes: trimmed(self.notes.clone()),
            next_follow_up_date: self.next_follow_up_date,
            quote_number: trimmed(self.quote_number.clone()),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LeadListParams {
    /// Id do vendedor, ou "all"
    pub sales_person_id: Option<String>,
    /// Status do lead, ou "all"
    pub status: Option<String>,
    pub search: Option<String>,
    /// status | next_follow_up_date | lead_created_date
    pub sort_by: Option<String>,
    /// asc | desc
    pub sort_dir: Option<String>,
    pub page: Option<i64>,
}
