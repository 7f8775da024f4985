use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::util::{deserialize_lenient_string, deserialize_string_list};

use super::{
    payment::is_payment_sufficient,
    readiness::{evaluate, Readiness, RequirementSource, Verdict},
    requirements::{Requirement, RequirementSet},
    truthy::is_satisfied,
};

/// One person's check-in for one event, as stored in the check-in table.
///
/// Requirement fields are kept as raw values since the store, the workflow engine
/// and the dashboard have all written different shapes over time.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinRecord {
    /// Record store handle, filled in from the record envelope.
    #[serde(skip_deserializing)]
    pub record_id: String,

    /// Creation time, filled in from the record envelope.
    #[serde(skip_deserializing)]
    pub created: Option<String>,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub tag: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub event_slug: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub telephone: Option<String>,

    pub member: Value,
    pub startgg: Value,
    pub payment_valid: Value,
    pub payment_amount: Value,
    pub payment_expected: Value,
    pub is_guest: Value,

    /// Last status written alongside a mutation. Only a cache.
    pub status: Option<String>,

    #[serde(deserialize_with = "deserialize_string_list")]
    pub tournament_games_registered: Vec<String>,

    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub startgg_event_id: Option<String>,
}

impl CheckinRecord {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or_default()
    }

    /// Operator approval of the payment. This alone decides the Payment requirement.
    pub fn payment_approved(&self) -> bool {
        is_satisfied(&self.payment_valid)
    }

    /// Whether the recorded amount covers the selected games. A hint for the
    /// operator deciding on approval, never part of readiness.
    pub fn payment_sufficient(&self) -> bool {
        is_payment_sufficient(
            &self.payment_amount,
            &self.payment_expected,
            &Value::Null,
        )
    }

    pub fn is_member(&self) -> bool {
        is_satisfied(&self.member)
    }

    pub fn on_startgg(&self) -> bool {
        is_satisfied(&self.startgg)
    }

    pub fn is_guest(&self) -> bool {
        is_satisfied(&self.is_guest)
    }

    pub fn persisted_status(&self) -> Option<Readiness> {
        self.status.as_deref().and_then(Readiness::parse)
    }

    pub fn verdict(&self, requirements: &RequirementSet) -> Verdict {
        evaluate(self, requirements)
    }

    /// Write a single requirement or informational field in place.
    pub fn set_field(&mut self, field: CheckinField, value: bool) {
        let value = Value::Bool(value);
        match field {
            CheckinField::Member => self.member = value,
            CheckinField::Startgg => self.startgg = value,
            CheckinField::PaymentValid => self.payment_valid = value,
            CheckinField::IsGuest => self.is_guest = value,
        }
    }
}

impl RequirementSource for CheckinRecord {
    fn requirement_value(&self, requirement: Requirement) -> Cow<'_, Value> {
        match requirement {
            Requirement::Membership => Cow::Borrowed(&self.member),
            Requirement::StartGg => Cow::Borrowed(&self.startgg),
            Requirement::Payment => Cow::Borrowed(&self.payment_valid),
        }
    }
}

/// A person in the player registry.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(skip_deserializing)]
    pub created: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub tag: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub telephone: Option<String>,
}

/// One archived event, as kept in the history tables.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventHistoryRecord {
    #[serde(skip_deserializing)]
    pub id: String,
    #[serde(skip_deserializing)]
    pub created: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub event_slug: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_string")]
    pub status: Option<String>,
    /// Count, linked records or a text list depending on how the archive was written.
    pub participants: Value,
}

/// Boolean check-in fields an operator may toggle from the dashboard.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinField {
    Member,
    Startgg,
    PaymentValid,
    IsGuest,
}

impl CheckinField {
    pub fn parse(name: &str) -> Option<CheckinField> {
        match name.trim() {
            "member" => Some(CheckinField::Member),
            "startgg" => Some(CheckinField::Startgg),
            "payment_valid" => Some(CheckinField::PaymentValid),
            "is_guest" => Some(CheckinField::IsGuest),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CheckinField::Member => "member",
            CheckinField::Startgg => "startgg",
            CheckinField::PaymentValid => "payment_valid",
            CheckinField::IsGuest => "is_guest",
        }
    }
}
