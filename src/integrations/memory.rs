use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::airtable::{Record, RecordFilter, RecordGateway, Table};
use crate::core::truthy::is_satisfied_opt;

/// Record gateway backed by process memory, with a switch to simulate an outage.
#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<Table, Vec<Record>>>,
    next_id: AtomicU64,
    failing: AtomicBool,
    patches: AtomicU64,
}

fn field_lower(record: &Record, field: &str) -> String {
    match record.fields.get(field) {
        Some(Value::String(s)) => s.to_lowercase(),
        _ => String::new(),
    }
}

fn field_eq(record: &Record, field: &str, expected: &str) -> bool {
    matches!(record.fields.get(field), Some(Value::String(s)) if s == expected)
}

fn matches(filter: &RecordFilter, record: &Record) -> bool {
    match filter {
        RecordFilter::EventSlug(slug) => field_eq(record, "event_slug", slug),
        RecordFilter::TagInEvent { tag, slug } => {
            field_lower(record, "tag") == tag.to_lowercase() && field_eq(record, "event_slug", slug)
        }
        RecordFilter::Identity { query, slug } => {
            let query = query.to_lowercase();
            let identity =
                field_lower(record, "name") == query || field_lower(record, "tag") == query;
            identity
                && slug
                    .as_deref()
                    .map_or(true, |slug| field_eq(record, "event_slug", slug))
        }
        RecordFilter::RecordId(id) => &record.id == id,
        RecordFilter::Active => is_satisfied_opt(record.fields.get("is_active")),
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record built from a JSON object, returning its id.
    pub fn insert(&self, table: Table, fields: Value) -> String {
        let id = format!("rec{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(Record {
                id: id.clone(),
                created_time: Some("2025-01-01T12:00:00.000Z".to_string()),
                fields,
            });
        id
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get(&self, table: Table, id: &str) -> Option<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .and_then(|records| records.iter().find(|r| r.id == id).cloned())
    }

    /// Number of successful patches, for asserting that rejected requests never wrote.
    pub fn patch_count(&self) -> u64 {
        self.patches.load(Ordering::SeqCst)
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("Simulated record store outage");
        }
        Ok(())
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn list_records(
        &self,
        table: Table,
        filter: Option<&RecordFilter>,
        _fields: &[&str],
        max_records: Option<usize>,
    ) -> anyhow::Result<Vec<Record>> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let records = tables
            .get(&table)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.map_or(true, |f| matches(f, r)))
                    .take(max_records.unwrap_or(usize::MAX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }

    async fn patch_record(
        &self,
        table: Table,
        id: &str,
        fields: Map<String, Value>,
        _typecast: bool,
    ) -> anyhow::Result<Record> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let record = tables
            .get_mut(&table)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| anyhow!("Record {} not found", id))?;

        record.fields.extend(fields);
        self.patches.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn delete_record(&self, table: Table, id: &str) -> anyhow::Result<()> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let records = tables.entry(table).or_default();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            bail!("Record {} not found", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_filters_match_formula_semantics() {
        let gateway = MemoryGateway::new();
        gateway.insert(
            Table::Checkins,
            json!({"name": "Viktor", "tag": "Logisticuz", "event_slug": "weekly"}),
        );
        gateway.insert(
            Table::Checkins,
            json!({"name": "Anna", "tag": "anna", "event_slug": "other"}),
        );

        let by_tag = RecordFilter::TagInEvent {
            tag: "LOGISTICUZ".into(),
            slug: "weekly".into(),
        };
        let found = gateway
            .list_records(Table::Checkins, Some(&by_tag), &[], None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let anywhere = RecordFilter::Identity {
            query: "anna".into(),
            slug: None,
        };
        let found = gateway
            .list_records(Table::Checkins, Some(&anywhere), &[], None)
            .await
            .unwrap();
        assert_eq!(found[0].fields["event_slug"], json!("other"));
    }

    #[tokio::test]
    async fn test_outage() {
        let gateway = MemoryGateway::new();
        gateway.set_failing(true);
        assert!(gateway.get_active_settings().await.is_err());
        gateway.set_failing(false);
        assert_eq!(gateway.get_active_settings().await.unwrap(), None);
    }
}
