use warp::http::StatusCode;

/// Failures surfaced to callers of the check-in service.
#[derive(thiserror::Error, Debug)]
pub enum CheckinError {
    /// No settings record is flagged active.
    #[error("System misconfigured: no active event settings found")]
    Misconfigured,

    /// The record store could not be reached or returned garbage.
    #[error("Status unavailable: {0}")]
    Unavailable(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid '{field}': {message}")]
    Validation { field: String, message: String },

    /// The tournament platform failed during an explicit sync.
    #[error("Tournament platform error: {0}")]
    Upstream(String),
}

impl CheckinError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        CheckinError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CheckinError::Misconfigured | CheckinError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CheckinError::NotFound(_) => StatusCode::NOT_FOUND,
            CheckinError::Validation { .. } => StatusCode::BAD_REQUEST,
            CheckinError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short machine-readable name used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckinError::Misconfigured => "misconfigured",
            CheckinError::Unavailable(_) => "unavailable",
            CheckinError::NotFound(_) => "not_found",
            CheckinError::Validation { .. } => "validation",
            CheckinError::Upstream(_) => "upstream",
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            CheckinError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for CheckinError {
    fn from(err: anyhow::Error) -> Self {
        CheckinError::Unavailable(err)
    }
}

pub type CheckinResult<T> = Result<T, CheckinError>;
