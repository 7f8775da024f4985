use std::sync::Arc;

use serde_json::{Map, Value};

use crate::{
    error::{CheckinError, CheckinResult},
    integrations::airtable::{Record, RecordFilter, RecordGateway, Table},
};

use super::{
    event_settings::SettingsRecord,
    participant::{CheckinRecord, EventHistoryRecord, PlayerRecord},
};

const CHECKIN_FIELDS: [&str; 16] = [
    "name",
    "email",
    "telephone",
    "tag",
    "payment_amount",
    "payment_expected",
    "payment_valid",
    "member",
    "startgg",
    "is_guest",
    "status",
    "tournament_games_registered",
    "event_slug",
    "startgg_event_id",
    "external_id",
    "UUID",
];

const PLAYER_FIELDS: [&str; 4] = ["name", "email", "tag", "telephone"];
const EVENT_HISTORY_FIELDS: [&str; 3] = ["event_slug", "status", "participants"];

fn parse_checkin(record: &Record) -> anyhow::Result<CheckinRecord> {
    let mut checkin: CheckinRecord = record.parse()?;
    checkin.record_id = record.id.clone();
    checkin.created = record.created_time.clone();
    Ok(checkin)
}

fn parse_checkins(records: &[Record]) -> Vec<CheckinRecord> {
    records
        .iter()
        .filter_map(|r| match parse_checkin(r) {
            Ok(checkin) => Some(checkin),
            Err(e) => {
                log::warn!("Skipping check-in: {}", e);
                None
            }
        })
        .collect()
}

/// Typed access to check-ins and settings over a [`RecordGateway`].
pub struct CheckinDb {
    gateway: Arc<dyn RecordGateway>,
}

impl CheckinDb {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        CheckinDb { gateway }
    }

    /// The active settings row. Missing settings are a configuration error, never an
    /// empty default.
    pub async fn active_settings(&self) -> CheckinResult<SettingsRecord> {
        let record = self
            .gateway
            .get_active_settings()
            .await?
            .ok_or(CheckinError::Misconfigured)?;

        let mut settings: SettingsRecord = record.parse()?;
        settings.record_id = record.id;
        Ok(settings)
    }

    pub async fn get_checkins(&self, slug: &str) -> CheckinResult<Vec<CheckinRecord>> {
        let records = self
            .gateway
            .list_records(
                Table::Checkins,
                Some(&RecordFilter::EventSlug(slug.to_string())),
                &CHECKIN_FIELDS,
                None,
            )
            .await?;

        log::debug!("Loaded {} check-ins for '{}'", records.len(), slug);
        Ok(parse_checkins(&records))
    }

    async fn find_one(&self, filter: RecordFilter) -> CheckinResult<Option<CheckinRecord>> {
        let records = self
            .gateway
            .list_records(Table::Checkins, Some(&filter), &[], Some(1))
            .await?;

        match records.first() {
            Some(record) => Ok(Some(parse_checkin(record)?)),
            None => Ok(None),
        }
    }

    pub async fn find_checkin_by_tag(
        &self,
        tag: &str,
        slug: &str,
    ) -> CheckinResult<Option<CheckinRecord>> {
        self.find_one(RecordFilter::TagInEvent {
            tag: tag.trim().to_string(),
            slug: slug.to_string(),
        })
        .await
    }

    /// Case-insensitive lookup on name or tag.
    pub async fn find_checkin_by_identity(
        &self,
        query: &str,
        slug: Option<&str>,
    ) -> CheckinResult<Option<CheckinRecord>> {
        self.find_one(RecordFilter::Identity {
            query: query.trim().to_string(),
            slug: slug.map(str::to_string),
        })
        .await
    }

    pub async fn find_checkin_by_id(&self, id: &str) -> CheckinResult<Option<CheckinRecord>> {
        self.find_one(RecordFilter::RecordId(id.to_string())).await
    }

    pub async fn update_checkin(
        &self,
        id: &str,
        fields: Map<String, Value>,
        typecast: bool,
    ) -> CheckinResult<CheckinRecord> {
        let record = self
            .gateway
            .patch_record(Table::Checkins, id, fields, typecast)
            .await?;
        Ok(parse_checkin(&record)?)
    }

    pub async fn delete_checkin(&self, id: &str) -> CheckinResult<()> {
        Ok(self.gateway.delete_record(Table::Checkins, id).await?)
    }

    pub async fn update_settings(
        &self,
        id: &str,
        fields: Map<String, Value>,
    ) -> CheckinResult<SettingsRecord> {
        let record = self
            .gateway
            .patch_record(Table::Settings, id, fields, true)
            .await?;
        let mut settings: SettingsRecord = record.parse()?;
        settings.record_id = record.id;
        Ok(settings)
    }

    /// Distinct event slugs seen in the check-in table, sorted, including the active one.
    pub async fn event_slugs(&self) -> CheckinResult<Vec<String>> {
        let records = self
            .gateway
            .list_records(Table::Checkins, None, &["event_slug"], None)
            .await?;

        let mut slugs: Vec<String> = records
            .iter()
            .filter_map(|r| r.fields.get("event_slug").and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        match self.active_settings().await {
            Ok(settings) => {
                if let Some(active) = settings.event_slug() {
                    slugs.push(active.to_string());
                }
            }
            Err(CheckinError::Misconfigured) => {}
            Err(e) => return Err(e),
        }

        slugs.sort();
        slugs.dedup();
        Ok(slugs)
    }

    /// The persistent player registry, independent of any event.
    pub async fn players(&self) -> CheckinResult<Vec<PlayerRecord>> {
        let records = self
            .gateway
            .list_records(Table::Players, None, &PLAYER_FIELDS, None)
            .await?;

        let players = records
            .iter()
            .filter_map(|r| match r.parse::<PlayerRecord>() {
                Ok(mut player) => {
                    player.id = r.id.clone();
                    player.created = r.created_time.clone();
                    Some(player)
                }
                Err(e) => {
                    log::warn!("Skipping player: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        log::info!("Retrieved {} players", players.len());
        Ok(players)
    }

    /// Archived events, in store order.
    pub async fn event_history(&self) -> CheckinResult<Vec<EventHistoryRecord>> {
        self.history(Table::EventHistory).await
    }

    /// The dashboard's denormalized copy of the archive.
    pub async fn event_history_dashboard(&self) -> CheckinResult<Vec<EventHistoryRecord>> {
        self.history(Table::EventHistoryDashboard).await
    }

    async fn history(&self, table: Table) -> CheckinResult<Vec<EventHistoryRecord>> {
        let records = self
            .gateway
            .list_records(table, None, &EVENT_HISTORY_FIELDS, None)
            .await?;

        let rows = records
            .iter()
            .filter_map(|r| match r.parse::<EventHistoryRecord>() {
                Ok(mut row) => {
                    row.id = r.id.clone();
                    row.created = r.created_time.clone();
                    Some(row)
                }
                Err(e) => {
                    log::warn!("Skipping history row: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        log::info!("Retrieved {} rows from {}", rows.len(), table.name());
        Ok(rows)
    }

    /// Whether the record store answers at all.
    pub async fn ping(&self) -> bool {
        match self
            .gateway
            .list_records(Table::Checkins, None, &[], Some(1))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Record store health check failed: {}", e);
                false
            }
        }
    }
}
