use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use time::OffsetDateTime;

use crate::{
    error::{CheckinError, CheckinResult},
    integrations::startgg::{extract_tournament_slug, TournamentLookup},
};

use super::{event_settings::merge_offered_games, hub::events, service::CheckinService};

/// Json struct for the admin sync action.
#[derive(Serialize, Deserialize, Debug)]
pub struct SyncRequest {
    pub link: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SyncSummary {
    pub slug: String,
    pub tournament_name: String,
    pub event_date: Option<String>,
    pub event_count: usize,
    pub offered_games: Vec<String>,
}

/// Calendar date (UTC) of a unix timestamp, as `YYYY-MM-DD`.
fn iso_date(unix: i64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(unix)
        .ok()
        .map(|dt| dt.date().to_string())
}

impl CheckinService {
    /// Point the active settings row at a start.gg tournament and refresh its game list.
    pub async fn sync_active_event(&self, link: &str) -> CheckinResult<SyncSummary> {
        let slug = extract_tournament_slug(link).ok_or_else(|| {
            CheckinError::validation("link", "Not a start.gg tournament link")
        })?;
        log::info!("Syncing active event from tournament '{}'", slug);

        self.lookup.invalidate(&slug);
        let tournament = self
            .lookup
            .fetch_tournament(&slug)
            .await
            .map_err(|e| CheckinError::Upstream(e.to_string()))?
            .ok_or_else(|| CheckinError::Upstream(format!("Tournament '{}' not found", slug)))?;

        let settings = self.db.active_settings().await?;

        let fetched = tournament.event_names();
        let offered = merge_offered_games(
            &settings.default_game,
            &settings.cached_event_names(),
            &fetched,
        );
        let event_date = tournament.start_at.and_then(iso_date);
        let events_json = json!({ "events": tournament.events() }).to_string();

        let mut fields = Map::new();
        fields.insert("active_event_slug".into(), json!(slug));
        fields.insert("event_date".into(), json!(event_date));
        fields.insert("default_game".into(), json!(offered));
        fields.insert("events_json".into(), Value::String(events_json));
        fields.insert("startgg_event_url".into(), json!(link.trim()));
        fields.insert("tournament_name".into(), json!(tournament.name));
        fields.insert("timezone".into(), json!(tournament.timezone));

        self.db.update_settings(&settings.record_id, fields).await?;

        let summary = SyncSummary {
            slug,
            tournament_name: tournament.name.clone(),
            event_date,
            event_count: fetched.len(),
            offered_games: offered,
        };

        log::info!(
            "Updated {} with {} events, {} offered in the form",
            summary.tournament_name,
            summary.event_count,
            summary.offered_games.len()
        );
        self.hub.broadcast(
            events::UPDATE,
            json!({ "settings": summary.slug, "tournament_name": summary.tournament_name }),
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        core::{
            hub::Delivery,
            service::testing::service_with,
        },
        integrations::{airtable::Table, startgg::fake::FakeLookup},
    };

    #[test]
    fn test_iso_date() {
        assert_eq!(iso_date(1_760_000_000).as_deref(), Some("2025-10-09"));
        assert_eq!(iso_date(0).as_deref(), Some("1970-01-01"));
    }

    #[tokio::test]
    async fn test_first_sync_offers_every_game() {
        let (gateway, service) = service_with(
            json!({"is_active": true}),
            FakeLookup::with("fgc-weekly", "FGC Weekly", &["SF6", "T8"]),
        );

        let summary = service
            .sync_active_event("https://www.start.gg/tournament/fgc-weekly/details")
            .await
            .unwrap();

        assert_eq!(summary.slug, "fgc-weekly");
        assert_eq!(summary.offered_games, vec!["SF6", "T8"]);
        assert_eq!(summary.event_date.as_deref(), Some("2025-10-09"));

        let stored = gateway.get(Table::Settings, "rec1").unwrap();
        assert_eq!(stored.fields["active_event_slug"], json!("fgc-weekly"));
        assert_eq!(stored.fields["tournament_name"], json!("FGC Weekly"));
        assert_eq!(stored.fields["timezone"], json!("Europe/Stockholm"));

        let settings = service.db.active_settings().await.unwrap();
        assert_eq!(settings.cached_event_names(), vec!["SF6", "T8"]);
    }

    #[tokio::test]
    async fn test_resync_keeps_operator_selection() {
        let (_, service) = service_with(
            json!({
                "is_active": true,
                "default_game": ["T8"],
                "events_json": r#"{"events":[{"name":"SF6"},{"name":"T8"}]}"#,
            }),
            FakeLookup::with("fgc-weekly", "FGC Weekly", &["SF6", "T8", "2XKO"]),
        );

        let mut sub = service.hub.subscribe();
        sub.next(Duration::from_millis(100)).await;

        let summary = service
            .sync_active_event("start.gg/tournament/fgc-weekly")
            .await
            .unwrap();
        assert_eq!(summary.offered_games, vec!["T8", "2XKO"]);

        match sub.next(Duration::from_millis(100)).await {
            Some(Delivery::Message(msg)) => assert_eq!(msg.event, events::UPDATE),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sync_errors() {
        let (gateway, service) = service_with(
            json!({"is_active": true}),
            FakeLookup::with("fgc-weekly", "FGC Weekly", &["SF6"]),
        );

        assert_eq!(
            service
                .sync_active_event("https://example.com/")
                .await
                .unwrap_err()
                .field(),
            Some("link")
        );
        assert!(matches!(
            service
                .sync_active_event("https://start.gg/tournament/unknown")
                .await,
            Err(CheckinError::Upstream(_))
        ));

        gateway.set_failing(true);
        assert!(matches!(
            service
                .sync_active_event("https://start.gg/tournament/fgc-weekly")
                .await,
            Err(CheckinError::Unavailable(_))
        ));
        assert_eq!(gateway.patch_count(), 0);
    }
}
