use std::{borrow::Cow, fmt::Display};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    requirements::{Requirement, RequirementSet},
    truthy::is_satisfied,
};

/// Two-valued outcome of checking a participant against the active requirements.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Readiness {
    Ready,
    Pending,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Ready => "Ready",
            Readiness::Pending => "Pending",
        }
    }

    /// Parse a persisted status cache. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Readiness> {
        match value.trim() {
            s if s.eq_ignore_ascii_case("ready") => Some(Readiness::Ready),
            s if s.eq_ignore_ascii_case("pending") => Some(Readiness::Pending),
            _ => None,
        }
    }
}

impl Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything that can report the raw value backing a requirement.
pub trait RequirementSource {
    fn requirement_value(&self, requirement: Requirement) -> Cow<'_, Value>;
}

impl RequirementSource for Map<String, Value> {
    fn requirement_value(&self, requirement: Requirement) -> Cow<'_, Value> {
        match self.get(requirement.field()) {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(Value::Null),
        }
    }
}

/// Result of [`evaluate`].
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Verdict {
    pub status: Readiness,
    /// Required but unsatisfied requirements, always in Membership, Payment, Start.gg order.
    pub missing: Vec<Requirement>,
}

impl Verdict {
    pub fn is_ready(&self) -> bool {
        self.status == Readiness::Ready
    }

    pub fn missing_labels(&self) -> Vec<&'static str> {
        self.missing.iter().map(|r| r.label()).collect()
    }
}

/// Compute a participant's readiness.
///
/// A requirement that is not enforced never contributes to `missing`, whatever the
/// participant's value for it. This is the only place readiness is decided; the
/// persisted `status` column is a write-time cache and must not be trusted.
pub fn evaluate<P: RequirementSource + ?Sized>(participant: &P, requirements: &RequirementSet) -> Verdict {
    let missing: Vec<Requirement> = requirements
        .enabled()
        .filter(|r| !is_satisfied(&participant.requirement_value(*r)))
        .collect();

    let status = if missing.is_empty() {
        Readiness::Ready
    } else {
        Readiness::Pending
    };

    Verdict { status, missing }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn participant(fields: Value) -> Map<String, Value> {
        match fields {
            Value::Object(map) => map,
            _ => panic!("participant fixture must be an object"),
        }
    }

    fn triples() -> Vec<(bool, bool, bool)> {
        let mut out = vec![];
        for a in [false, true] {
            for b in [false, true] {
                for c in [false, true] {
                    out.push((a, b, c));
                }
            }
        }
        out
    }

    #[test]
    fn test_free_event() {
        let p = participant(json!({"member": false, "payment_valid": false, "startgg": false}));
        let verdict = evaluate(&p, &RequirementSet::none());
        assert_eq!(verdict.status, Readiness::Ready);
        assert!(verdict.missing.is_empty());
    }

    #[test]
    fn test_empty_participant_with_no_requirements() {
        let verdict = evaluate(&Map::new(), &RequirementSet::none());
        assert!(verdict.is_ready());
    }

    #[test]
    fn test_startgg_only_event() {
        let reqs = RequirementSet {
            require_startgg: true,
            ..Default::default()
        };

        let verdict = evaluate(&participant(json!({"startgg": false})), &reqs);
        assert_eq!(verdict.status, Readiness::Pending);
        assert_eq!(verdict.missing_labels(), vec!["Start.gg"]);

        let verdict = evaluate(&participant(json!({"startgg": true})), &reqs);
        assert_eq!(verdict.status, Readiness::Ready);
        assert!(verdict.missing.is_empty());
    }

    #[test]
    fn test_full_requirements_partial_completion() {
        let p = participant(json!({"member": true, "payment_valid": false, "startgg": true}));
        let verdict = evaluate(&p, &RequirementSet::all());
        assert_eq!(verdict.status, Readiness::Pending);
        assert_eq!(verdict.missing_labels(), vec!["Payment"]);
    }

    #[test]
    fn test_missing_order_is_stable() {
        let verdict = evaluate(&Map::new(), &RequirementSet::all());
        assert_eq!(
            verdict.missing_labels(),
            vec!["Membership", "Payment", "Start.gg"]
        );
    }

    #[test]
    fn test_glyph_and_string_values() {
        let p = participant(json!({"member": "✓", "payment_valid": "TRUE", "startgg": "✗"}));
        let verdict = evaluate(&p, &RequirementSet::all());
        assert_eq!(verdict.missing, vec![Requirement::StartGg]);
    }

    #[test]
    fn test_exhaustive_requirement_combinations() {
        for (req_m, req_p, req_s) in triples() {
            let reqs = RequirementSet {
                require_membership: req_m,
                require_payment: req_p,
                require_startgg: req_s,
            };

            for (m, p, s) in triples() {
                let fields = participant(json!({"member": m, "payment_valid": p, "startgg": s}));
                let verdict = evaluate(&fields, &reqs);

                let mut expected = vec![];
                if req_m && !m {
                    expected.push(Requirement::Membership);
                }
                if req_p && !p {
                    expected.push(Requirement::Payment);
                }
                if req_s && !s {
                    expected.push(Requirement::StartGg);
                }

                assert_eq!(verdict.missing, expected);
                assert_eq!(verdict.is_ready(), expected.is_empty());
                assert_eq!(evaluate(&fields, &reqs), verdict);
            }
        }
    }

    #[test]
    fn test_parse_status_cache() {
        assert_eq!(Readiness::parse("Ready"), Some(Readiness::Ready));
        assert_eq!(Readiness::parse(" pending "), Some(Readiness::Pending));
        assert_eq!(Readiness::parse("Klar"), None);
    }
}
