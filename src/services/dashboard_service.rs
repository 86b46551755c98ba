// src/services/dashboard_service.rs

use std::collections::HashMap;

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::{DashboardRepository, DealRepository, LeadRepository},
    models::{
        auth::CurrentUser,
        dashboard::{
            CashFlowEntry, CashFlowRow, CategoryShare, DashboardSummary, DatedOrderRow,
            LeadSourceRow, MonthlyOrdersEntry, SalesPersonRow,
        },
        deal::DealStats,
        lead::LeadSource,
    },
    services::{
        filters::{DateRange, DealQuery, LeadQuery, chart_month, chart_year},
        policy::{self, Permission},
    },
};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const UNKNOWN: &str = "Unknown";

// Parcela do valor total esperada em caixa na medição final
fn cash_flow_share() -> Decimal {
    Decimal::new(35, 2)
}

pub fn conversion_rate(total_deals: i64, total_leads: i64) -> f64 {
    if total_leads <= 0 {
        return 0.0;
    }
    total_deals as f64 / total_leads as f64 * 100.0
}

pub fn summarize(total_leads: i64, deals: &DealStats) -> DashboardSummary {
    let total_deals = deals.count as i64;
    DashboardSummary {
        total_leads,
        total_deals,
        total_revenue: deals.total_value,
        conversion_rate: conversion_rate(total_deals, total_leads),
    }
}

pub fn monthly_orders(rows: &[DatedOrderRow]) -> Vec<MonthlyOrdersEntry> {
    let mut buckets = [(Decimal::ZERO, Decimal::ZERO); 12];
    for row in rows {
        let bucket = &mut buckets[row.order_date.month0() as usize];
        bucket.0 += row.total_value;
        bucket.1 += row.amount_in;
    }

    MONTHS
        .iter()
        .zip(buckets)
        .map(|(month, (total_value, amount_in))| MonthlyOrdersEntry {
            month: month.to_string(),
            total_value,
            amount_in,
        })
        .collect()
}

pub fn cash_flow(rows: &[CashFlowRow]) -> Vec<CashFlowEntry> {
    let mut buckets = [Decimal::ZERO; 12];
    for row in rows {
        if let Some(date) = row.final_size_date {
            buckets[date.month0() as usize] += row.total_value;
        }
    }

    MONTHS
        .iter()
        .zip(buckets)
        .map(|(month, total)| CashFlowEntry {
            month: month.to_string(),
            expected_cash_flow: (total * cash_flow_share()).round_dp(2),
        })
        .collect()
}

/// `social_media_ads` -> `Social Media Ads`
pub fn humanize(source: LeadSource) -> String {
    source
        .as_str()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Maior valor primeiro; empate pelo nome
fn sorted_shares(totals: HashMap<String, Decimal>) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(name, value)| CategoryShare { name, value })
        .collect();
    shares.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    shares
}

pub fn share_by_source(rows: &[LeadSourceRow]) -> Vec<CategoryShare> {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for row in rows {
        let name = row
            .lead_found_through
            .map(humanize)
            .unwrap_or_else(|| UNKNOWN.to_string());
        *totals.entry(name).or_default() += row.total_value;
    }
    sorted_shares(totals)
}

pub fn share_by_person(rows: &[SalesPersonRow]) -> Vec<CategoryShare> {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for row in rows {
        let name = row
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        *totals.entry(name).or_default() += row.total_value;
    }
    sorted_shares(totals)
}

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    lead_repo: LeadRepository,
    deal_repo: DealRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, lead_repo: LeadRepository, deal_repo: DealRepository) -> Self {
        Self {
            repo,
            lead_repo,
            deal_repo,
        }
    }

    /// Cards do topo. Receita e número de deals vêm das mesmas linhas da
    /// listagem de deals do cargo.
    pub async fn summary(&self, user: &CurrentUser) -> Result<DashboardSummary, AppError> {
        let total_leads = self
            .lead_repo
            .count_leads(
                self.lead_repo.pool(),
                &LeadQuery::conversion_base(user.role, user.id),
            )
            .await?;

        let stats = if policy::allows(user.role, Permission::ViewDeals) {
            let deals = self
                .deal_repo
                .list(&DealQuery::for_role(user.role, user.id, None))
                .await?;
            DealStats::from_orders(deals.iter().map(|d| &d.order))
        } else {
            DealStats::default()
        };

        Ok(summarize(total_leads, &stats))
    }

    pub async fn monthly_orders(&self, year: Option<&str>) -> Result<Vec<MonthlyOrdersEntry>, AppError> {
        let range = DateRange::year(chart_year(year, Utc::now().date_naive()))?;
        let rows = self.repo.orders_between(range).await?;
        Ok(monthly_orders(&rows))
    }

    pub async fn cash_flow(&self, year: Option<&str>) -> Result<Vec<CashFlowEntry>, AppError> {
        let range = DateRange::year(chart_year(year, Utc::now().date_naive()))?;
        let rows = self.repo.final_sizes_between(range).await?;
        Ok(cash_flow(&rows))
    }

    pub async fn lead_source_share(&self, month: Option<&str>) -> Result<Vec<CategoryShare>, AppError> {
        let (year, month) = chart_month(month, Utc::now().date_naive());
        let rows = self.repo.lead_sources_between(DateRange::month(year, month)?).await?;
        Ok(share_by_source(&rows))
    }

    pub async fn sales_person_share(&self, month: Option<&str>) -> Result<Vec<CategoryShare>, AppError> {
        let (year, month) = chart_month(month, Utc::now().date_naive());
        let rows = self.repo.sales_people_between(DateRange::month(year, month)?).await?;
        Ok(share_by_person(&rows))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn d(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn date(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn conversion_rate_is_zero_without_leads() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(3, 0), 0.0);
        assert_eq!(conversion_rate(1, 4), 25.0);
        assert_eq!(conversion_rate(2, 2), 100.0);
    }

    #[test]
    fn summary_rate_counts_won_leads_in_the_base() {
        // Vendedor com 3 leads (1 ganho) e um deal
        let deals = DealStats {
            count: 1,
            total_value: d("11300"),
            ..DealStats::default()
        };
        let summary = summarize(3, &deals);
        assert_eq!(summary.total_deals, 1);
        assert_eq!(summary.total_revenue, d("11300"));
        assert!((summary.conversion_rate - 100.0 / 3.0).abs() < 1e-9);

        let empty = summarize(0, &DealStats::default());
        assert_eq!(empty.conversion_rate, 0.0);
        assert_eq!(empty.total_revenue, Decimal::ZERO);
    }

    #[test]
    fn monthly_orders_always_has_twelve_buckets() {
        let rows = vec![
            DatedOrderRow { order_date: date(2026, 1, 5), total_value: d("100"), amount_in: d("90") },
            DatedOrderRow { order_date: date(2026, 1, 31), total_value: d("50"), amount_in: d("40") },
            DatedOrderRow { order_date: date(2026, 12, 1), total_value: d("10"), amount_in: d("10") },
        ];
        let buckets = monthly_orders(&rows);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[0].month, "Jan");
        assert_eq!(buckets[0].total_value, d("150"));
        assert_eq!(buckets[0].amount_in, d("130"));
        assert_eq!(buckets[5].total_value, Decimal::ZERO);
        assert_eq!(buckets[11].month, "Dec");
        assert_eq!(buckets[11].total_value, d("10"));
        assert_eq!(monthly_orders(&[]).len(), 12);
    }

    #[test]
    fn cash_flow_is_35_percent_by_final_size_month() {
        let rows = vec![
            CashFlowRow { final_size_date: Some(date(2026, 3, 10)), total_value: d("1000") },
            CashFlowRow { final_size_date: Some(date(2026, 3, 20)), total_value: d("200") },
            CashFlowRow { final_size_date: None, total_value: d("999") },
        ];
        let buckets = cash_flow(&rows);
        assert_eq!(buckets[2].month, "Mar");
        assert_eq!(buckets[2].expected_cash_flow, d("420"));
        let total: Decimal = buckets.iter().map(|b| b.expected_cash_flow).sum();
        assert_eq!(total, d("420"));
    }

    #[test]
    fn lead_sources_are_humanized() {
        assert_eq!(humanize(LeadSource::SocialMedia), "Social Media");
        assert_eq!(humanize(LeadSource::WordOfMouth), "Word Of Mouth");
        assert_eq!(humanize(LeadSource::Sunny), "Sunny");
    }

    #[test]
    fn source_shares_group_sort_and_label_missing_sources() {
        let rows = vec![
            LeadSourceRow { lead_found_through: Some(LeadSource::Scanner), total_value: d("100") },
            LeadSourceRow { lead_found_through: None, total_value: d("300") },
            LeadSourceRow { lead_found_through: Some(LeadSource::Scanner), total_value: d("250") },
            LeadSourceRow { lead_found_through: Some(LeadSource::Architect), total_value: d("300") },
        ];
        let shares = share_by_source(&rows);
        let names: Vec<_> = shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Scanner", "Architect", "Unknown"]);
        assert_eq!(shares[0].value, d("350"));
    }

    #[test]
    fn person_shares_fall_back_to_unknown() {
        let rows = vec![
            SalesPersonRow { full_name: Some("Ana".into()), total_value: d("10") },
            SalesPersonRow { full_name: None, total_value: d("5") },
            SalesPersonRow { full_name: Some("  ".into()), total_value: d("5") },
            SalesPersonRow { full_name: Some("Ana".into()), total_value: d("15") },
        ];
        let shares = share_by_person(&rows);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Ana");
        assert_eq!(shares[0].value, d("25"));
        assert_eq!(shares[1].name, "Unknown");
        assert_eq!(shares[1].value, d("10"));
    }
}
