// src/services/filters.rs
//
// Tradução dos parâmetros de tela (filtros, ordenação, paginação, datas) para
// valores tipados que os repositórios transformam em SQL.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{auth::Role, lead::LeadStatus, quote::QuoteType},
    services::policy::{self, Permission},
};

pub const PAGE_SIZE: i64 = 25;
const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// "all" e string vazia significam "sem filtro".
pub fn optional_param(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

pub fn parse_uuid_param(name: &str, value: Option<&str>) -> Result<Option<Uuid>, AppError> {
    optional_param(value)
        .map(|v| {
            Uuid::parse_str(v).map_err(|_| AppError::invalid(format!("Invalid {}: '{}'", name, v)))
        })
        .transpose()
}

pub fn parse_lead_status(value: Option<&str>) -> Result<Option<LeadStatus>, AppError> {
    optional_param(value)
        .map(|v| match v {
            "new" => Ok(LeadStatus::New),
            "quote_made" => Ok(LeadStatus::QuoteMade),
            "negotiation" => Ok(LeadStatus::Negotiation),
            "won" => Ok(LeadStatus::Won),
            "lost" => Ok(LeadStatus::Lost),
            "unqualified" => Ok(LeadStatus::Unqualified),
            other => Err(AppError::invalid(format!("Invalid status: '{}'", other))),
        })
        .transpose()
}

pub fn parse_quote_type(value: Option<&str>) -> Result<Option<QuoteType>, AppError> {
    optional_param(value)
        .map(|v| match v {
            "fresh" => Ok(QuoteType::Fresh),
            "revisal" => Ok(QuoteType::Revisal),
            other => Err(AppError::invalid(format!("Invalid quote type: '{}'", other))),
        })
        .transpose()
}

/// Termo de busca para ILIKE, com os curingas do usuário escapados.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =========================================================================
//  PAGINAÇÃO
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
}

impl Pagination {
    /// Páginas começam em 1; qualquer coisa menor vira 1. O teto mantém o
    /// OFFSET representável em i64.
    pub fn new(page: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }

    pub fn total_pages(total: i64) -> i64 {
        if total <= 0 { 0 } else { (total + PAGE_SIZE - 1) / PAGE_SIZE }
    }

    pub fn has_more(&self, total: i64) -> bool {
        self.page < Self::total_pages(total)
    }
}

// =========================================================================
//  ORDENAÇÃO DE LEADS
// =========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LeadSortField {
    #[default]
    Status,
    NextFollowUpDate,
    LeadCreatedDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadSort {
    pub field: LeadSortField,
    pub direction: SortDirection,
}

impl LeadSort {
    pub fn parse(sort_by: Option<&str>, sort_dir: Option<&str>) -> Result<Self, AppError> {
        let field = match optional_param(sort_by) {
            None | Some("status") => LeadSortField::Status,
            Some("next_follow_up_date") => LeadSortField::NextFollowUpDate,
            Some("lead_created_date") => LeadSortField::LeadCreatedDate,
            Some(other) => return Err(AppError::invalid(format!("Invalid sortBy: '{}'", other))),
        };
        let direction = match optional_param(sort_dir) {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => return Err(AppError::invalid(format!("Invalid sortDir: '{}'", other))),
        };
        Ok(Self { field, direction })
    }

    /// Cláusula ORDER BY (sem a palavra-chave) sobre o alias `l`.
    /// O id no final deixa a ordem total, então as páginas não se sobrepõem.
    pub fn order_by_sql(&self) -> String {
        let dir = self.direction.sql();
        match self.field {
            LeadSortField::Status => format!(
                "{} {}, l.lead_created_date DESC, l.id ASC",
                status_ordinal_sql("l.status"),
                dir
            ),
            LeadSortField::NextFollowUpDate => format!(
                "l.next_follow_up_date {} NULLS LAST, l.lead_created_date DESC, l.id ASC",
                dir
            ),
            LeadSortField::LeadCreatedDate => {
                format!("l.lead_created_date {}, l.id ASC", dir)
            }
        }
    }
}

fn status_ordinal_sql(column: &str) -> String {
    let arms: String = [
        LeadStatus::New,
        LeadStatus::QuoteMade,
        LeadStatus::Negotiation,
        LeadStatus::Won,
        LeadStatus::Lost,
        LeadStatus::Unqualified,
    ]
    .iter()
    .map(|s| format!(" WHEN '{}' THEN {}", s.as_str(), s.ordinal()))
    .collect();
    format!("CASE {}{} END", column, arms)
}

// =========================================================================
//  DATAS
// =========================================================================

/// Intervalo semiaberto [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn year(year: i32) -> Result<Self, AppError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(AppError::invalid(format!("Invalid year: {}", year))),
        }
    }

    pub fn month(year: i32, month: u32) -> Result<Self, AppError> {
        let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let start = NaiveDate::from_ymd_opt(year, month, 1);
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1);
        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(AppError::invalid(format!("Invalid month: {}-{:02}", year, month))),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

fn parse_year(value: &str) -> Option<i32> {
    value.parse::<i32>().ok().filter(|y| (1900..=2999).contains(y))
}

fn parse_month(value: &str) -> Option<u32> {
    value.parse::<u32>().ok().filter(|m| (1..=12).contains(m))
}

fn year_filter(value: Option<&str>) -> Result<Option<i32>, AppError> {
    optional_param(value)
        .map(|v| parse_year(v).ok_or_else(|| AppError::invalid(format!("Invalid year: '{}'", v))))
        .transpose()
}

fn month_filter(value: Option<&str>) -> Result<Option<u32>, AppError> {
    optional_param(value)
        .map(|v| parse_month(v).ok_or_else(|| AppError::invalid(format!("Invalid month: '{}'", v))))
        .transpose()
}

/// Filtro de data dos deals (sobre order_date).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealDateFilter {
    Any,
    Range(DateRange),
    // Só o mês: casa o mês em todos os anos
    MonthOfAnyYear(u32),
}

impl DealDateFilter {
    pub fn parse(year: Option<&str>, month: Option<&str>) -> Result<Self, AppError> {
        Ok(match (year_filter(year)?, month_filter(month)?) {
            (Some(y), Some(m)) => DealDateFilter::Range(DateRange::month(y, m)?),
            (Some(y), None) => DealDateFilter::Range(DateRange::year(y)?),
            (None, Some(m)) => DealDateFilter::MonthOfAnyYear(m),
            (None, None) => DealDateFilter::Any,
        })
    }
}

/// Filtro de data dos pedidos de orçamento (sobre quoted_at).
/// Só o mês: o mês no ano corrente.
pub fn quote_date_range(
    year: Option<&str>,
    month: Option<&str>,
    today: NaiveDate,
) -> Result<Option<DateRange>, AppError> {
    match (year_filter(year)?, month_filter(month)?) {
        (Some(y), Some(m)) => DateRange::month(y, m).map(Some),
        (Some(y), None) => DateRange::year(y).map(Some),
        (None, Some(m)) => DateRange::month(today.year(), m).map(Some),
        (None, None) => Ok(None),
    }
}

/// Parâmetro `year` dos gráficos; malformado ou ausente vira o ano corrente.
pub fn chart_year(value: Option<&str>, today: NaiveDate) -> i32 {
    value
        .map(str::trim)
        .and_then(parse_year)
        .unwrap_or_else(|| today.year())
}

/// Parâmetro `month` ("YYYY-MM") dos gráficos; malformado ou ausente vira o mês corrente.
pub fn chart_month(value: Option<&str>, today: NaiveDate) -> (i32, u32) {
    value
        .map(str::trim)
        .and_then(|v| v.split_once('-'))
        .and_then(|(y, m)| Some((parse_year(y)?, parse_month(m)?)))
        .unwrap_or_else(|| (today.year(), today.month()))
}

// =========================================================================
//  VISIBILIDADE + FILTROS DE LEADS
// =========================================================================

/// Consulta de leads já restrita ao que o cargo pode ver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    // Só leads atribuídos a este usuário
    pub assigned_to: Option<Uuid>,
    // Esconde won/lost
    pub hide_closed: bool,
    pub status: Option<LeadStatus>,
    pub search: Option<String>,
    pub sort: LeadSort,
}

impl LeadQuery {
    /// Vendedor vê só os próprios leads (o filtro de vendedor é ignorado);
    /// os demais cargos podem filtrar por vendedor. Quem não tem
    /// ViewClosedLeads nunca vê won/lost.
    pub fn for_role(role: Role, user_id: Uuid, sales_person_id: Option<Uuid>) -> Self {
        let assigned_to = if role == Role::SalesRep {
            Some(user_id)
        } else {
            sales_person_id
        };

        Self {
            assigned_to,
            hide_closed: !policy::allows(role, Permission::ViewClosedLeads),
            ..Self::default()
        }
    }

    /// Base da taxa de conversão: os mesmos donos da listagem, mas com os
    /// leads ganhos e perdidos incluídos.
    pub fn conversion_base(role: Role, user_id: Uuid) -> Self {
        Self {
            hide_closed: false,
            ..Self::for_role(role, user_id, None)
        }
    }

    pub fn with_status(mut self, status: Option<LeadStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = optional_param(search).map(str::to_owned);
        self
    }

    pub fn with_sort(mut self, sort: LeadSort) -> Self {
        self.sort = sort;
        self
    }
}

// =========================================================================
//  VISIBILIDADE + FILTROS DE DEALS
// =========================================================================

/// Consulta de deals já restrita ao que o cargo pode ver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealQuery {
    pub sales_rep_id: Option<Uuid>,
    pub date: DealDateFilter,
}

impl DealQuery {
    /// Vendedor vê só os próprios deals; só quem tem FilterDealsBySalesRep
    /// pode filtrar por vendedor (para os demais o filtro é ignorado).
    pub fn for_role(role: Role, user_id: Uuid, sales_person_id: Option<Uuid>) -> Self {
        let sales_rep_id = if role == Role::SalesRep {
            Some(user_id)
        } else if policy::allows(role, Permission::FilterDealsBySalesRep) {
            sales_person_id
        } else {
            None
        };

        Self {
            sales_rep_id,
            date: DealDateFilter::Any,
        }
    }

    pub fn with_date(mut self, date: DealDateFilter) -> Self {
        self.date = date;
        self
    }
}
