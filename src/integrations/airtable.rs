use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

const PAGE_SIZE: usize = 100;
const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const BACKOFF_BASE: Duration = Duration::from_millis(300);

/// Tables of the record store this service touches.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub enum Table {
    /// One row per participant per event.
    Checkins,
    Settings,
    Players,
    /// Archived per-event snapshots.
    EventHistory,
    /// Denormalized copy of the archive read by the dashboard.
    EventHistoryDashboard,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Checkins => "active_event_data",
            Table::Settings => "settings",
            Table::Players => "players",
            Table::EventHistory => "event_history",
            Table::EventHistoryDashboard => "event_history_dashboard",
        }
    }
}

/// Record selection understood by every gateway.
#[derive(PartialEq, Debug, Clone)]
pub enum RecordFilter {
    EventSlug(String),
    /// Case-insensitive tag match within one event.
    TagInEvent { tag: String, slug: String },
    /// Case-insensitive match on either name or tag, optionally within one event.
    Identity { query: String, slug: Option<String> },
    RecordId(String),
    /// The settings row flagged active.
    Active,
}

/// Quote a literal for use inside a store formula.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl RecordFilter {
    pub fn to_formula(&self) -> String {
        match self {
            RecordFilter::EventSlug(slug) => format!("{{event_slug}} = {}", quote_literal(slug)),
            RecordFilter::TagInEvent { tag, slug } => format!(
                "AND(LOWER({{tag}}) = {}, {{event_slug}} = {})",
                quote_literal(&tag.to_lowercase()),
                quote_literal(slug)
            ),
            RecordFilter::Identity { query, slug } => {
                let q = quote_literal(&query.to_lowercase());
                let identity = format!("OR(LOWER({{name}}) = {}, LOWER({{tag}}) = {})", q, q);
                match slug {
                    Some(slug) => format!(
                        "AND({}, {{event_slug}} = {})",
                        identity,
                        quote_literal(slug)
                    ),
                    None => identity,
                }
            }
            RecordFilter::RecordId(id) => format!("RECORD_ID() = {}", quote_literal(id)),
            RecordFilter::Active => "{is_active}=TRUE()".to_string(),
        }
    }
}

/// A raw record envelope.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime", default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Deserialize the record's fields into a typed view.
    pub fn parse<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| anyhow!("Malformed record {}: {}", self.id, e))
    }
}

/// The only way this service reads or writes persistent state.
///
/// Every failure (unreachable store, non-2xx status, malformed payload) comes back
/// as `Err`, with no partial state assumed.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// List every matching record, following pagination. An empty `fields` slice
    /// requests all fields.
    async fn list_records(
        &self,
        table: Table,
        filter: Option<&RecordFilter>,
        fields: &[&str],
        max_records: Option<usize>,
    ) -> anyhow::Result<Vec<Record>>;

    /// The single settings row flagged active, if any.
    async fn get_active_settings(&self) -> anyhow::Result<Option<Record>> {
        let records = self
            .list_records(Table::Settings, Some(&RecordFilter::Active), &[], Some(1))
            .await?;
        Ok(records.into_iter().next())
    }

    /// Write the given fields, leaving the others untouched.
    async fn patch_record(
        &self,
        table: Table,
        id: &str,
        fields: Map<String, Value>,
        typecast: bool,
    ) -> anyhow::Result<Record>;

    async fn delete_record(&self, table: Table, id: &str) -> anyhow::Result<()>;
}

#[derive(Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<Record>,
    offset: Option<String>,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: bool,
}

/// HTTP gateway for an Airtable base.
pub struct AirtableGateway {
    client: reqwest::Client,
    root: Url,
    base_id: String,
    retries: u32,
}

impl AirtableGateway {
    pub fn new(
        root: &str,
        base_id: &str,
        api_key: &str,
        timeout: Duration,
        retries: u32,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(AirtableGateway {
            client,
            root: Url::parse(root)?,
            base_id: base_id.to_string(),
            retries,
        })
    }

    fn table_url(&self, table: Table, id: Option<&str>) -> anyhow::Result<Url> {
        let mut url = self.root.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("Record store URL {} cannot be a base", self.root))?;
            segments.pop_if_empty().push(&self.base_id).push(table.name());
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Send a request, retrying throttled and transient server responses with
    /// exponential backoff.
    async fn send<F>(&self, what: &str, build: F) -> anyhow::Result<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder + Send,
    {
        let mut attempt = 0;
        loop {
            let response = build().send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if RETRY_STATUSES.contains(&status.as_u16()) && attempt < self.retries {
                let delay = BACKOFF_BASE * 2u32.pow(attempt);
                log::warn!(
                    "{} returned {}, retrying in {}ms",
                    what,
                    status,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            bail!("{} failed with {}: {}", what, status, body);
        }
    }
}

#[async_trait]
impl RecordGateway for AirtableGateway {
    async fn list_records(
        &self,
        table: Table,
        filter: Option<&RecordFilter>,
        fields: &[&str],
        max_records: Option<usize>,
    ) -> anyhow::Result<Vec<Record>> {
        let url = self.table_url(table, None)?;

        let mut params: Vec<(String, String)> = vec![("pageSize".into(), PAGE_SIZE.to_string())];
        if let Some(filter) = filter {
            let formula = filter.to_formula();
            log::debug!("Listing '{}' where {}", table.name(), formula);
            params.push(("filterByFormula".into(), formula));
        }
        for field in fields {
            params.push(("fields[]".into(), field.to_string()));
        }
        if let Some(max) = max_records {
            params.push(("maxRecords".into(), max.to_string()));
        }

        let what = format!("Listing '{}'", table.name());
        let mut records = vec![];
        let mut offset: Option<String> = None;

        loop {
            let page: ListPage = self
                .send(&what, || {
                    let request = self.client.get(url.clone()).query(&params);
                    match &offset {
                        Some(offset) => request.query(&[("offset", offset)]),
                        None => request,
                    }
                })
                .await?
                .json()
                .await?;

            log::debug!("Fetched page of {} from '{}'", page.records.len(), table.name());
            records.extend(page.records);

            if let Some(max) = max_records {
                if records.len() >= max {
                    records.truncate(max);
                    break;
                }
            }

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    async fn patch_record(
        &self,
        table: Table,
        id: &str,
        fields: Map<String, Value>,
        typecast: bool,
    ) -> anyhow::Result<Record> {
        let url = self.table_url(table, Some(id))?;
        let body = json!({ "fields": fields, "typecast": typecast });
        let what = format!("Patching {} in '{}'", id, table.name());

        let record: Record = self
            .send(&what, || self.client.patch(url.clone()).json(&body))
            .await?
            .json()
            .await?;

        log::info!("Patched {} in '{}'", id, table.name());
        Ok(record)
    }

    async fn delete_record(&self, table: Table, id: &str) -> anyhow::Result<()> {
        let url = self.table_url(table, Some(id))?;
        let what = format!("Deleting {} from '{}'", id, table.name());

        let response: DeleteResponse = self
            .send(&what, || self.client.delete(url.clone()))
            .await?
            .json()
            .await?;

        if !response.deleted {
            bail!("Record store refused to delete {}", id);
        }

        log::info!("Deleted {} from '{}'", id, table.name());
        Ok(())
    }
}
