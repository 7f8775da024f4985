use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    error::{CheckinError, CheckinResult},
    integrations::startgg::{CachedTournamentLookup, TournamentEvent, TournamentLookup},
};

use super::{
    dashboard::{build_rows, dashboard_stats, visible_columns, DashboardFilter, DashboardRow, DashboardStats},
    db::CheckinDb,
    event_settings::SettingsRecord,
    hub::{events, BroadcastHub},
    participant::{CheckinField, CheckinRecord, EventHistoryRecord, PlayerRecord},
    payment::{expected_payment, parse_amount},
    readiness::{Readiness, Verdict},
    requirements::RequirementSet,
    validation::{sanitize_checkin_payload, validate_checkin_payload},
};

/// Identifies the check-in a mutation applies to: either the record id, or a tag
/// within an event (the active one when `slug` is omitted).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RecordTarget {
    pub record_id: Option<String>,
    pub tag: Option<String>,
    pub slug: Option<String>,
}

impl RecordTarget {
    fn validate(&self) -> CheckinResult<()> {
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if has(&self.record_id) || has(&self.tag) {
            Ok(())
        } else {
            Err(CheckinError::validation(
                "record_id",
                "Either 'record_id' or 'tag' is required",
            ))
        }
    }

    fn describe(&self) -> String {
        match (&self.record_id, &self.tag) {
            (Some(id), _) if !id.trim().is_empty() => id.clone(),
            (_, Some(tag)) => format!("tag '{}'", tag),
            _ => "unknown check-in".to_string(),
        }
    }
}

/// Json struct for a single field toggle.
#[derive(Serialize, Deserialize, Debug)]
pub struct ToggleRequest {
    #[serde(flatten)]
    pub target: RecordTarget,
    pub field: String,
    pub value: Value,
}

/// Json struct for a payment approval. `approved` defaults to true.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApprovePaymentRequest {
    #[serde(flatten)]
    pub target: RecordTarget,
    pub approved: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetGamesRequest {
    #[serde(flatten)]
    pub target: RecordTarget,
    pub games: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SetMemberRequest {
    #[serde(flatten)]
    pub target: RecordTarget,
    pub member: Value,
}

/// The result of a mutation: the record's fresh verdict after the write.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub record_id: String,
    pub name: String,
    pub tag: String,
    pub status: Readiness,
    pub missing: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_expected: Option<f64>,
}

impl MutationOutcome {
    fn new(record: &CheckinRecord, verdict: &Verdict) -> Self {
        MutationOutcome {
            record_id: record.record_id.clone(),
            name: record.name().to_string(),
            tag: record.tag().to_string(),
            status: verdict.status,
            missing: verdict.missing_labels(),
            field: None,
            value: None,
            payment_expected: None,
        }
    }

    fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Public status of one participant, with the toggles echoed so a polling client
/// knows which sections to render.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub name: String,
    pub tag: String,
    pub event_slug: String,
    pub ready: bool,
    pub status: Readiness,
    pub missing: Vec<&'static str>,
    pub member: bool,
    pub payment: bool,
    pub payment_sufficient: bool,
    pub startgg: bool,
    pub is_guest: bool,
    #[serde(flatten)]
    pub requirements: RequirementSet,
    pub games: Vec<String>,
    pub payment_expected: f64,
    pub swish_number: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RequirementsView {
    #[serde(flatten)]
    pub requirements: RequirementSet,
    pub summary: String,
    pub columns: Vec<&'static str>,
    pub event_slug: Option<String>,
    pub tournament_name: Option<String>,
    pub swish_number: Option<String>,
    pub price_per_game: f64,
    pub offered_games: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Health {
    pub status: &'static str,
    pub record_store: bool,
    pub subscribers: usize,
    pub version: &'static str,
}

/// An explicit slug wins over the active event's slug.
fn slug_or_active(slug: Option<&str>, settings: &SettingsRecord) -> CheckinResult<String> {
    match slug.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => Ok(slug.to_string()),
        None => settings
            .event_slug()
            .map(str::to_string)
            .ok_or(CheckinError::Misconfigured),
    }
}

fn require_bool(field: &str, value: &Value) -> CheckinResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(CheckinError::validation(
            field,
            format!("Expected a boolean, got {}", other),
        )),
    }
}

/// Everything a request handler needs, shared across the process.
pub struct CheckinService {
    pub db: CheckinDb,
    pub hub: Arc<BroadcastHub>,
    pub lookup: CachedTournamentLookup,
    pub keepalive: Duration,
}

impl CheckinService {
    pub fn new(
        db: CheckinDb,
        hub: Arc<BroadcastHub>,
        lookup: CachedTournamentLookup,
        keepalive: Duration,
    ) -> Self {
        CheckinService {
            db,
            hub,
            lookup,
            keepalive,
        }
    }

    async fn locate(
        &self,
        target: &RecordTarget,
        settings: &SettingsRecord,
    ) -> CheckinResult<CheckinRecord> {
        let found = match (target.record_id.as_deref(), target.tag.as_deref()) {
            (Some(id), _) if !id.trim().is_empty() => self.db.find_checkin_by_id(id.trim()).await?,
            (_, Some(tag)) => {
                let slug = slug_or_active(target.slug.as_deref(), settings)?;
                self.db.find_checkin_by_tag(tag, &slug).await?
            }
            _ => None,
        };

        found.ok_or_else(|| CheckinError::NotFound(format!("No check-in for {}", target.describe())))
    }

    /// Persist the mutated fields together with the freshly computed status.
    async fn commit(
        &self,
        record: &CheckinRecord,
        requirements: &RequirementSet,
        mut fields: Map<String, Value>,
        typecast: bool,
    ) -> CheckinResult<(CheckinRecord, Verdict)> {
        let verdict = record.verdict(requirements);
        fields.insert("status".into(), json!(verdict.status.as_str()));

        let updated = self
            .db
            .update_checkin(&record.record_id, fields, typecast)
            .await?;

        log::info!(
            "Updated {} ({}): {}",
            updated.name(),
            updated.record_id,
            verdict.status
        );
        Ok((updated, verdict))
    }

    pub async fn participant_status(
        &self,
        name: &str,
        slug: Option<&str>,
    ) -> CheckinResult<StatusReport> {
        if name.trim().is_empty() {
            return Err(CheckinError::validation("name", "Name or tag is required"));
        }

        let settings = self.db.active_settings().await?;
        let slug = slug_or_active(slug, &settings)?;

        let record = self
            .db
            .find_checkin_by_identity(name, Some(&slug))
            .await?
            .ok_or_else(|| CheckinError::NotFound(format!("No check-in for '{}'", name.trim())))?;

        let requirements = settings.requirements();
        let verdict = record.verdict(&requirements);

        Ok(StatusReport {
            name: record.name().to_string(),
            tag: record.tag().to_string(),
            event_slug: slug,
            ready: verdict.is_ready(),
            status: verdict.status,
            missing: verdict.missing_labels(),
            member: record.is_member(),
            payment: record.payment_approved(),
            payment_sufficient: record.payment_sufficient(),
            startgg: record.on_startgg(),
            is_guest: record.is_guest(),
            requirements,
            games: record.tournament_games_registered.clone(),
            payment_expected: parse_amount(&record.payment_expected),
            swish_number: settings.swish_number.clone(),
        })
    }

    pub async fn requirements(&self) -> CheckinResult<RequirementsView> {
        let settings = self.db.active_settings().await?;
        let requirements = settings.requirements();

        Ok(RequirementsView {
            requirements,
            summary: requirements.summary(),
            columns: visible_columns(&requirements),
            event_slug: settings.event_slug().map(str::to_string),
            tournament_name: settings.tournament_name.clone(),
            swish_number: settings.swish_number.clone(),
            price_per_game: parse_amount(settings.price_per_game()),
            offered_games: settings.default_game.clone(),
        })
    }

    pub async fn dashboard(
        &self,
        slug: Option<&str>,
        filter: &DashboardFilter,
    ) -> CheckinResult<Vec<DashboardRow>> {
        let settings = self.db.active_settings().await?;
        let slug = slug_or_active(slug, &settings)?;
        let records = self.db.get_checkins(&slug).await?;
        Ok(build_rows(&records, &settings.requirements(), filter))
    }

    pub async fn stats(&self, slug: Option<&str>) -> CheckinResult<DashboardStats> {
        let settings = self.db.active_settings().await?;
        let requirements = settings.requirements();
        let slug = slug_or_active(slug, &settings)?;
        let records = self.db.get_checkins(&slug).await?;
        let rows = build_rows(&records, &requirements, &DashboardFilter::default());
        Ok(dashboard_stats(&rows, &requirements))
    }

    pub async fn event_slugs(&self) -> CheckinResult<Vec<String>> {
        self.db.event_slugs().await
    }

    pub async fn players(&self) -> CheckinResult<Vec<PlayerRecord>> {
        self.db.players().await
    }

    pub async fn event_history(
        &self,
        dashboard_view: bool,
    ) -> CheckinResult<Vec<EventHistoryRecord>> {
        if dashboard_view {
            self.db.event_history_dashboard().await
        } else {
            self.db.event_history().await
        }
    }

    pub async fn tournament_events(&self, slug: &str) -> Vec<TournamentEvent> {
        self.lookup.fetch_events(slug).await
    }

    pub async fn health(&self) -> Health {
        let record_store = self.db.ping().await;
        Health {
            status: if record_store { "ok" } else { "degraded" },
            record_store,
            subscribers: self.hub.subscriber_count(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// Accept a check-in notification from the workflow engine and fan it out.
    pub async fn notify_checkin(&self, payload: Map<String, Value>) -> CheckinResult<Value> {
        let cleaned = sanitize_checkin_payload(&payload);
        let issues = validate_checkin_payload(&cleaned);

        if let Some(first) = issues.first() {
            let message = issues
                .iter()
                .map(|i| i.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            log::warn!("Rejected check-in notification: {}", message);
            return Err(CheckinError::validation(first.field, message));
        }

        let payload = Value::Object(cleaned);
        let delivered = self.hub.broadcast(events::CHECKIN, payload.clone());
        log::info!("Check-in notification delivered to {} viewers", delivered);

        Ok(json!({ "accepted": true, "delivered": delivered, "checkin": payload }))
    }

    pub async fn toggle_field(&self, request: ToggleRequest) -> CheckinResult<MutationOutcome> {
        let field = CheckinField::parse(&request.field).ok_or_else(|| {
            CheckinError::validation("field", format!("Unknown field '{}'", request.field))
        })?;
        let value = require_bool("value", &request.value)?;
        request.target.validate()?;

        let settings = self.db.active_settings().await?;
        let mut record = self.locate(&request.target, &settings).await?;
        record.set_field(field, value);

        let mut fields = Map::new();
        fields.insert(field.column().into(), Value::Bool(value));
        let (updated, verdict) = self
            .commit(&record, &settings.requirements(), fields, false)
            .await?;

        let outcome = MutationOutcome {
            field: Some(field.column()),
            value: Some(Value::Bool(value)),
            ..MutationOutcome::new(&updated, &verdict)
        };
        self.hub.broadcast(events::UPDATE, outcome.payload());
        Ok(outcome)
    }

    pub async fn approve_payment(
        &self,
        request: ApprovePaymentRequest,
    ) -> CheckinResult<MutationOutcome> {
        let approved = match &request.approved {
            Some(value) => require_bool("approved", value)?,
            None => true,
        };
        request.target.validate()?;

        let settings = self.db.active_settings().await?;
        let mut record = self.locate(&request.target, &settings).await?;
        record.set_field(CheckinField::PaymentValid, approved);

        let mut fields = Map::new();
        fields.insert(CheckinField::PaymentValid.column().into(), Value::Bool(approved));
        let (updated, verdict) = self
            .commit(&record, &settings.requirements(), fields, false)
            .await?;

        let outcome = MutationOutcome {
            field: Some(CheckinField::PaymentValid.column()),
            value: Some(Value::Bool(approved)),
            ..MutationOutcome::new(&updated, &verdict)
        };
        self.hub.broadcast(events::PAYMENT_APPROVED, outcome.payload());
        Ok(outcome)
    }

    pub async fn delete_checkin(&self, target: RecordTarget) -> CheckinResult<Value> {
        target.validate()?;

        let settings = self.db.active_settings().await?;
        let record = self.locate(&target, &settings).await?;
        self.db.delete_checkin(&record.record_id).await?;
        log::info!("Deleted check-in {} ({})", record.name(), record.record_id);

        let payload = json!({
            "record_id": record.record_id,
            "name": record.name(),
            "tag": record.tag(),
        });
        self.hub.broadcast(events::DELETED, payload.clone());
        Ok(payload)
    }

    /// Replace a participant's game selection and recompute what they owe.
    pub async fn set_games(&self, request: SetGamesRequest) -> CheckinResult<MutationOutcome> {
        request.target.validate()?;
        let games: Vec<String> = request
            .games
            .iter()
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();

        let settings = self.db.active_settings().await?;
        let mut record = self.locate(&request.target, &settings).await?;

        let expected = expected_payment(&games, settings.price_per_game());
        record.tournament_games_registered = games.clone();
        record.payment_expected = json!(expected);

        let mut fields = Map::new();
        fields.insert("tournament_games_registered".into(), json!(games));
        fields.insert("payment_expected".into(), json!(expected));
        let (updated, verdict) = self
            .commit(&record, &settings.requirements(), fields, true)
            .await?;

        let outcome = MutationOutcome {
            field: Some("tournament_games_registered"),
            value: Some(json!(games)),
            payment_expected: Some(expected),
            ..MutationOutcome::new(&updated, &verdict)
        };
        self.hub.broadcast(events::UPDATE, outcome.payload());
        Ok(outcome)
    }

    pub async fn set_member(&self, request: SetMemberRequest) -> CheckinResult<MutationOutcome> {
        let member = require_bool("member", &request.member)?;
        request.target.validate()?;

        let settings = self.db.active_settings().await?;
        let mut record = self.locate(&request.target, &settings).await?;
        record.set_field(CheckinField::Member, member);

        let mut fields = Map::new();
        fields.insert(CheckinField::Member.column().into(), Value::Bool(member));
        let (updated, verdict) = self
            .commit(&record, &settings.requirements(), fields, false)
            .await?;

        let outcome = MutationOutcome {
            field: Some(CheckinField::Member.column()),
            value: Some(Value::Bool(member)),
            ..MutationOutcome::new(&updated, &verdict)
        };
        self.hub.broadcast(events::UPDATE, outcome.payload());
        Ok(outcome)
    }
}


#[cfg(test)]
mod tests {
    use crate::{
        core::hub::{Delivery, Subscription},
        integrations::{airtable::Table, startgg::fake::FakeLookup},
    };

    use super::{testing::service_with, *};

    fn all_required() -> Value {
        json!({
            "is_active": true,
            "active_event_slug": "weekly",
            "require_payment": true,
            "require_membership": true,
            "require_startgg": true,
            "swish_expected_per_game": 25,
            "swish_number": "1234567890",
        })
    }

    async fn next_event(sub: &mut Subscription) -> (String, Value) {
        match sub.next(Duration::from_millis(200)).await {
            Some(Delivery::Message(msg)) => (msg.event, msg.data),
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_for_partial_completion() {
        let (gateway, service) = service_with(all_required(), FakeLookup::default());
        gateway.insert(
            Table::Checkins,
            json!({"name": "Viktor", "tag": "logisticuz", "event_slug": "weekly",
                   "member": true, "payment_valid": false, "startgg": true}),
        );

        let report = service.participant_status("LOGISTICUZ", None).await.unwrap();
        assert_eq!(report.status, Readiness::Pending);
        assert_eq!(report.missing, vec!["Payment"]);
        assert!(report.requirements.require_payment);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], json!("Pending"));
        assert_eq!(json["require_startgg"], json!(true));
    }

    #[tokio::test]
    async fn test_status_errors() {
        let (gateway, service) = service_with(all_required(), FakeLookup::default());
        assert!(matches!(
            service.participant_status("ghost", None).await,
            Err(CheckinError::NotFound(_))
        ));

        gateway.set_failing(true);
        assert!(matches!(
            service.participant_status("ghost", None).await,
            Err(CheckinError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_recomputes_persists_and_broadcasts_once() {
        let (gateway, service) = service_with(
            json!({"is_active": true, "active_event_slug": "weekly", "require_startgg": true}),
            FakeLookup::default(),
        );
        let id = gateway.insert(
            Table::Checkins,
            json!({"name": "Viktor", "tag": "logisticuz", "event_slug": "weekly", "status": "Pending"}),
        );

        let mut sub = service.hub.subscribe();
        next_event(&mut sub).await;

        let outcome = service
            .toggle_field(ToggleRequest {
                target: RecordTarget {
                    tag: Some("Logisticuz".into()),
                    ..Default::default()
                },
                field: "startgg".into(),
                value: json!(true),
            })
            .await
            .unwrap();

        assert_eq!(outcome.status, Readiness::Ready);
        let stored = gateway.get(Table::Checkins, &id).unwrap();
        assert_eq!(stored.fields["startgg"], json!(true));
        assert_eq!(stored.fields["status"], json!("Ready"));

        let (event, data) = next_event(&mut sub).await;
        assert_eq!(event, events::UPDATE);
        assert_eq!(data["record_id"], json!(id));
        assert_eq!(
            sub.next(Duration::from_millis(20)).await,
            Some(Delivery::KeepAlive)
        );
    }

    #[tokio::test]
    async fn test_invalid_mutations_never_touch_the_store() {
        let (gateway, service) = service_with(all_required(), FakeLookup::default());
        gateway.insert(Table::Checkins, json!({"tag": "x", "event_slug": "weekly"}));

        let bad_value = service
            .toggle_field(ToggleRequest {
                target: RecordTarget {
                    tag: Some("x".into()),
                    ..Default::default()
                },
                field: "member".into(),
                value: json!("yes"),
            })
            .await
            .unwrap_err();
        assert_eq!(bad_value.field(), Some("value"));

        let bad_field = service
            .toggle_field(ToggleRequest {
                target: RecordTarget::default(),
                field: "status".into(),
                value: json!(true),
            })
            .await
            .unwrap_err();
        assert_eq!(bad_field.field(), Some("field"));

        let no_identity = service
            .set_member(SetMemberRequest {
                target: RecordTarget::default(),
                member: json!(true),
            })
            .await
            .unwrap_err();
        assert_eq!(no_identity.field(), Some("record_id"));

        assert_eq!(gateway.patch_count(), 0);
    }

    #[tokio::test]
    async fn test_set_games_recomputes_expected_payment() {
        let (gateway, service) = service_with(all_required(), FakeLookup::default());
        let id = gateway.insert(
            Table::Checkins,
            json!({"name": "Anna", "tag": "anna", "event_slug": "weekly",
                   "member": true, "startgg": true, "payment_amount": 50}),
        );

        let outcome = service
            .set_games(SetGamesRequest {
                target: RecordTarget {
                    record_id: Some(id.clone()),
                    ..Default::default()
                },
                games: vec!["SF6".into(), "T8".into(), " ".into()],
            })
            .await
            .unwrap();
        assert_eq!(outcome.payment_expected, Some(50.0));
        assert_eq!(outcome.status, Readiness::Pending);
        assert_eq!(outcome.missing, vec!["Payment"]);
        let stored = gateway.get(Table::Checkins, &id).unwrap();
        assert_eq!(stored.fields["payment_expected"], json!(50.0));

        let outcome = service
            .set_games(SetGamesRequest {
                target: RecordTarget {
                    record_id: Some(id.clone()),
                    ..Default::default()
                },
                games: vec!["SF6".into(), "T8".into(), "GGST".into()],
            })
            .await
            .unwrap();
        assert_eq!(outcome.payment_expected, Some(75.0));
        assert_eq!(outcome.missing, vec!["Payment"]);

        let stored = gateway.get(Table::Checkins, &id).unwrap();
        assert_eq!(stored.fields["tournament_games_registered"], json!(["SF6", "T8", "GGST"]));
        assert_eq!(stored.fields["status"], json!("Pending"));
    }

    #[tokio::test]
    async fn test_approve_payment_and_delete() {
        let (gateway, service) = service_with(all_required(), FakeLookup::default());
        let id = gateway.insert(
            Table::Checkins,
            json!({"name": "Erik", "tag": "erk", "event_slug": "weekly", "member": true, "startgg": true}),
        );
        let mut sub = service.hub.subscribe();
        next_event(&mut sub).await;

        let outcome = service
            .approve_payment(ApprovePaymentRequest {
                target: RecordTarget {
                    record_id: Some(id.clone()),
                    ..Default::default()
                },
                approved: None,
            })
            .await
            .unwrap();
        assert_eq!(outcome.status, Readiness::Ready);
        assert_eq!(next_event(&mut sub).await.0, events::PAYMENT_APPROVED);

        service
            .delete_checkin(RecordTarget {
                record_id: Some(id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(next_event(&mut sub).await.0, events::DELETED);
        assert!(gateway.get(Table::Checkins, &id).is_none());

        let missing = service
            .delete_checkin(RecordTarget {
                record_id: Some(id),
                ..Default::default()
            })
            .await;
        assert!(matches!(missing, Err(CheckinError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_notify_checkin() {
        let (_, service) = service_with(all_required(), FakeLookup::default());
        let mut sub = service.hub.subscribe();
        next_event(&mut sub).await;

        let payload = json!({"name": " Viktor ", "tag": "logisticuz", "telephone": "070-123 45 67"});
        service
            .notify_checkin(payload.as_object().cloned().unwrap())
            .await
            .unwrap();

        let (event, data) = next_event(&mut sub).await;
        assert_eq!(event, events::CHECKIN);
        assert_eq!(data["name"], json!("Viktor"));
        assert_eq!(data["telephone"], json!("0701234567"));

        let invalid = service
            .notify_checkin(json!({"tag": "x"}).as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert_eq!(invalid.field(), Some("name"));
    }

    #[tokio::test]
    async fn test_dashboard_and_stats() {
        let (gateway, service) = service_with(
            json!({"is_active": true, "active_event_slug": "weekly", "require_membership": true}),
            FakeLookup::default(),
        );
        gateway.insert(Table::Checkins, json!({"name": "A", "tag": "a", "event_slug": "weekly", "member": true}));
        gateway.insert(Table::Checkins, json!({"name": "B", "tag": "b", "event_slug": "weekly"}));
        gateway.insert(Table::Checkins, json!({"name": "C", "tag": "c", "event_slug": "older"}));

        let rows = service.dashboard(None, &DashboardFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);

        let older = service.dashboard(Some("older"), &DashboardFilter::default()).await.unwrap();
        assert_eq!(older.len(), 1);

        let stats = service.stats(None).await.unwrap();
        assert_eq!((stats.ready, stats.pending), (1, 1));

        let view = service.requirements().await.unwrap();
        assert_eq!(view.columns, vec!["name", "tag", "telephone", "member", "status"]);
        assert_eq!(view.summary, "Requiring: Membership");
    }
}
