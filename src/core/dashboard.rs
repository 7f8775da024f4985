//! Operator dashboard view model.
//!
//! Every readiness figure shown on the dashboard comes from [`evaluate`] through
//! [`CheckinRecord::verdict`], never from the persisted `status` column.
//!
//! [`evaluate`]: super::readiness::evaluate

use serde::{Deserialize, Serialize};

use super::{
    participant::CheckinRecord,
    payment::parse_amount,
    readiness::Readiness,
    requirements::{Requirement, RequirementSet},
};

const BASE_COLUMNS: [&str; 3] = ["name", "tag", "telephone"];

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub record_id: String,
    pub name: String,
    pub tag: String,
    pub telephone: Option<String>,
    pub email: Option<String>,
    pub event_slug: Option<String>,
    pub created: Option<String>,
    pub status: Readiness,
    pub missing: Vec<&'static str>,
    /// The persisted status disagrees with the fresh verdict.
    pub stale: bool,
    pub member: bool,
    pub payment: bool,
    /// Recorded amount covers the selected games. Shown next to the approval toggle.
    pub payment_sufficient: bool,
    pub startgg: bool,
    pub is_guest: bool,
    pub games: Vec<String>,
    pub payment_amount: f64,
    pub payment_expected: f64,
}

impl DashboardRow {
    pub fn build(record: &CheckinRecord, requirements: &RequirementSet) -> Self {
        let verdict = record.verdict(requirements);
        DashboardRow {
            record_id: record.record_id.clone(),
            name: record.name().to_string(),
            tag: record.tag().to_string(),
            telephone: record.telephone.clone(),
            email: record.email.clone(),
            event_slug: record.event_slug.clone(),
            created: record.created.clone(),
            stale: record.persisted_status() != Some(verdict.status),
            missing: verdict.missing_labels(),
            status: verdict.status,
            member: record.is_member(),
            payment: record.payment_approved(),
            payment_sufficient: record.payment_sufficient(),
            startgg: record.on_startgg(),
            is_guest: record.is_guest(),
            games: record.tournament_games_registered.clone(),
            payment_amount: parse_amount(&record.payment_amount),
            payment_expected: parse_amount(&record.payment_expected),
        }
    }

    fn matches_search(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.tag.to_lowercase().contains(needle)
    }
}

/// Row selection for the check-in table.
#[derive(PartialEq, Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    pub status: Option<Readiness>,
    pub search: Option<String>,
}

impl DashboardFilter {
    pub fn accepts(&self, row: &DashboardRow) -> bool {
        if let Some(status) = self.status {
            if row.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => row.matches_search(&needle.to_lowercase()),
            _ => true,
        }
    }
}

/// Evaluate every record and keep the rows the filter accepts, newest first.
pub fn build_rows(
    records: &[CheckinRecord],
    requirements: &RequirementSet,
    filter: &DashboardFilter,
) -> Vec<DashboardRow> {
    let mut rows: Vec<DashboardRow> = records
        .iter()
        .map(|r| DashboardRow::build(r, requirements))
        .filter(|row| filter.accepts(row))
        .collect();

    rows.sort_by(|a, b| b.created.cmp(&a.created));
    rows
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct AttentionItem {
    pub record_id: String,
    pub name: String,
    pub tag: String,
    pub missing: Vec<&'static str>,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub ready: usize,
    pub pending: usize,
    pub guests: usize,
    pub summary: String,
    pub requirements: RequirementSet,
    pub needs_attention: Vec<AttentionItem>,
}

pub fn dashboard_stats(rows: &[DashboardRow], requirements: &RequirementSet) -> DashboardStats {
    let ready = rows.iter().filter(|r| r.status == Readiness::Ready).count();

    DashboardStats {
        total: rows.len(),
        ready,
        pending: rows.len() - ready,
        guests: rows.iter().filter(|r| r.is_guest).count(),
        summary: requirements.summary(),
        requirements: *requirements,
        needs_attention: rows
            .iter()
            .filter(|r| r.status == Readiness::Pending)
            .map(|r| AttentionItem {
                record_id: r.record_id.clone(),
                name: r.name.clone(),
                tag: r.tag.clone(),
                missing: r.missing.clone(),
            })
            .collect(),
    }
}

/// Columns shown in the check-in table. A requirement's column is only shown while
/// it is enforced.
pub fn visible_columns(requirements: &RequirementSet) -> Vec<&'static str> {
    let mut columns = BASE_COLUMNS.to_vec();
    columns.extend(requirements.enabled().map(|r: Requirement| r.field()));
    columns.push("status");
    columns
}
