use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event_settings::SettingsRecord;

/// One of the independently toggleable readiness dimensions.
///
/// The declaration order is the order in which missing requirements are reported.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Membership,
    Payment,
    StartGg,
}

impl Requirement {
    pub const ALL: [Requirement; 3] = [
        Requirement::Membership,
        Requirement::Payment,
        Requirement::StartGg,
    ];

    /// Human readable label, rendered verbatim by the dashboard and status page.
    pub fn label(&self) -> &'static str {
        match self {
            Requirement::Membership => "Membership",
            Requirement::Payment => "Payment",
            Requirement::StartGg => "Start.gg",
        }
    }

    /// Participant record field carrying this requirement's state.
    pub fn field(&self) -> &'static str {
        match self {
            Requirement::Membership => "member",
            Requirement::Payment => "payment_valid",
            Requirement::StartGg => "startgg",
        }
    }
}

/// Which requirements the active event enforces.
///
/// Always derived fresh from a settings snapshot, never persisted.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RequirementSet {
    pub require_payment: bool,
    pub require_membership: bool,
    pub require_startgg: bool,
}

impl RequirementSet {
    pub fn all() -> Self {
        RequirementSet {
            require_payment: true,
            require_membership: true,
            require_startgg: true,
        }
    }

    pub fn none() -> Self {
        RequirementSet::default()
    }

    pub fn requires(&self, requirement: Requirement) -> bool {
        match requirement {
            Requirement::Membership => self.require_membership,
            Requirement::Payment => self.require_payment,
            Requirement::StartGg => self.require_startgg,
        }
    }

    /// Enforced requirements in reporting order.
    pub fn enabled(&self) -> impl Iterator<Item = Requirement> + '_ {
        Requirement::ALL.into_iter().filter(|r| self.requires(*r))
    }

    pub fn is_free(&self) -> bool {
        self.enabled().next().is_none()
    }

    /// Operator facing summary of what the event currently enforces.
    pub fn summary(&self) -> String {
        if self.is_free() {
            "No requirements (all players auto-Ready)".to_string()
        } else {
            let labels: Vec<&str> = self.enabled().map(|r| r.label()).collect();
            format!("Requiring: {}", labels.join(", "))
        }
    }
}

/// A toggle is on only when the settings field is literally `true`.
///
/// Checkbox columns in the record store are omitted when unchecked, so a missing
/// field, `null` and an explicit `false` all mean "not required".
fn toggle_on(value: &Option<Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// Derive the requirement toggles from the active settings record.
pub fn resolve_requirements(settings: &SettingsRecord) -> RequirementSet {
    RequirementSet {
        require_payment: toggle_on(&settings.require_payment),
        require_membership: toggle_on(&settings.require_membership),
        require_startgg: toggle_on(&settings.require_startgg),
    }
}
