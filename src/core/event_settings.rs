use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{deserialize_lenient_string, deserialize_string_list};

use super::requirements::{resolve_requirements, RequirementSet};

/// The event configuration row currently flagged active.
///
/// Requirement toggles are kept as raw values: the store omits unchecked
/// checkboxes, and [`resolve_requirements`] owns the interpretation.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsRecord {
    /// Record store handle, filled in from the record envelope.
    #[serde(skip)]
    pub record_id: String,

    pub active_event_slug: Option<String>,
    pub is_active: Option<Value>,

    pub require_payment: Option<Value>,
    pub require_membership: Option<Value>,
    pub require_startgg: Option<Value>,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub swish_number: Option<String>,
    pub swish_expected_per_game: Value,

    /// Games currently offered in the registration form, in operator order.
    #[serde(deserialize_with = "deserialize_string_list")]
    pub default_game: Vec<String>,

    /// Cached event list from the tournament platform, `{"events": [...]}` either as
    /// a JSON string or inline.
    pub events_json: Option<Value>,

    pub tournament_name: Option<String>,
    pub event_date: Option<String>,
    pub timezone: Option<String>,
    pub startgg_event_url: Option<String>,
}

impl SettingsRecord {
    pub fn requirements(&self) -> RequirementSet {
        resolve_requirements(self)
    }

    pub fn price_per_game(&self) -> &Value {
        &self.swish_expected_per_game
    }

    /// Event slug with surrounding whitespace removed, `None` when unset.
    pub fn event_slug(&self) -> Option<&str> {
        self.active_event_slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Names of the events stored in `events_json` the last time the tournament was synced.
    pub fn cached_event_names(&self) -> Vec<String> {
        let parsed = match &self.events_json {
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("Failed to parse cached events_json: {}", e);
                    return vec![];
                }
            },
            Some(other) => other.clone(),
            None => return vec![],
        };

        let events = match &parsed {
            Value::Object(map) => map.get("events").cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };

        match events {
            Value::Array(list) => list
                .iter()
                .filter_map(|e| e.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
            _ => vec![],
        }
    }
}

/// Reconcile the operator's offered-games selection with a fresh event list.
///
/// On first sync every fetched game is offered. Afterwards the operator's picks
/// that still exist keep their order, followed by games that were not in the
/// previous fetch, in platform order. Games the operator removed stay removed.
pub fn merge_offered_games(current: &[String], previous: &[String], fetched: &[String]) -> Vec<String> {
    if current.is_empty() {
        let mut out: Vec<String> = vec![];
        for name in fetched {
            if !out.contains(name) {
                out.push(name.clone());
            }
        }
        return out;
    }

    let mut out: Vec<String> = current
        .iter()
        .filter(|name| fetched.contains(name))
        .cloned()
        .collect();

    for name in fetched {
        if !previous.contains(name) && !out.contains(name) {
            out.push(name.clone());
        }
    }

    out
}
