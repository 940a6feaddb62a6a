//! Error type shared by every Linode operation.
//!
//! Nothing in this crate retries: every remote failure surfaces here, on the
//! first attempt, to the caller.

use std::fmt;

use crate::linode_transport::Action;

/// One entry of the `ERRORARRAY` the Linode API returns on failure.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct ApiFault {
    /// Numeric error code.
    #[serde(rename = "ERRORCODE")]
    pub code: i64,
    /// Human readable message.
    #[serde(rename = "ERRORMESSAGE")]
    pub message: String,
}

/// Error type for Linode operations.
#[derive(Debug)]
pub enum LinodeError {
    /// Missing required environment variable.
    MissingEnv(&'static str),
    /// Invalid environment variable value.
    InvalidEnv {
        /// The environment variable key.
        key: &'static str,
        /// The reason for invalidity.
        reason: &'static str,
    },
    /// Configuration file missing, unreadable or malformed.
    Config {
        /// File the problem was found in (or the search path).
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// HTTP client error.
    Http(reqwest::Error),
    /// JSON parsing error.
    Json(String),
    /// Non-success HTTP status.
    Api {
        /// HTTP status code.
        status: reqwest::StatusCode,
        /// Response body.
        body: String,
    },
    /// The API answered with a non-empty `ERRORARRAY`.
    Remote {
        /// Action that failed.
        action: Action,
        /// Reported faults.
        faults: Vec<ApiFault>,
    },
    /// The response did not carry the expected data.
    EmptyResponse,
    /// A required wire key was absent from a payload.
    MissingField {
        /// Entity type being read.
        entity: &'static str,
        /// Wire key that was missing.
        field: String,
    },
    /// A value could not be converted to or from its wire form.
    InvalidField {
        /// Entity type being read or written.
        entity: &'static str,
        /// Attribute or wire key involved.
        field: String,
        /// Conversion failure.
        reason: String,
    },
    /// The attribute is not declared on this entity type.
    UnknownAttribute {
        /// Entity type.
        entity: &'static str,
        /// Attribute name that was used.
        name: String,
    },
    /// A finder lookup returned nothing.
    NotFound {
        /// Entity type.
        entity: &'static str,
        /// Description of the lookup.
        lookup: String,
    },
    /// `find` matched zero entities.
    NoMatch {
        /// Entity type.
        entity: &'static str,
        /// Rendered search criteria.
        criteria: String,
    },
    /// `find` matched more than one entity.
    MultipleMatches {
        /// Entity type.
        entity: &'static str,
        /// Rendered search criteria.
        criteria: String,
        /// Number of matches.
        count: usize,
    },
    /// A required argument was not supplied.
    MissingParameter {
        /// Operation that required it.
        operation: &'static str,
        /// Parameter name.
        param: &'static str,
    },
    /// An argument was supplied but is not acceptable.
    InvalidParameter {
        /// Operation that rejected it.
        operation: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The remote job reported failure.
    JobFailed {
        /// Job label.
        label: String,
        /// Owning Linode.
        linode_id: i64,
        /// Job id.
        job_id: i64,
    },
    /// The job did not finish within the allowed time.
    Timeout {
        /// Job label.
        label: String,
        /// Owning Linode.
        linode_id: i64,
        /// Budget that was exhausted, in seconds.
        timeout_secs: u64,
    },
    /// The resource type does not support the operation.
    Unsupported {
        /// Entity type.
        entity: &'static str,
        /// Operation name.
        operation: &'static str,
    },
}

impl fmt::Display for LinodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(k) => write!(f, "missing required env var: {k}"),
            Self::InvalidEnv { key, reason } => write!(f, "invalid env var {key}: {reason}"),
            Self::Config { path, reason } => write!(f, "config error in '{path}': {reason}"),
            Self::Http(e) => write!(f, "http error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Api { status, body } => {
                write!(f, "linode api error: status={status}, body={body}")
            }
            Self::Remote { action, faults } => {
                let msg = faults
                    .iter()
                    .map(|fault| format!("{} (code {})", fault.message, fault.code))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{action} failed: {msg}")
            }
            Self::EmptyResponse => write!(f, "empty response from server"),
            Self::MissingField { entity, field } => {
                write!(f, "API did not return required '{field}' value for '{entity}' object")
            }
            Self::InvalidField {
                entity,
                field,
                reason,
            } => write!(f, "invalid '{field}' value for '{entity}' object: {reason}"),
            Self::UnknownAttribute { entity, name } => {
                write!(f, "'{entity}' objects have no attribute '{name}'")
            }
            Self::NotFound { entity, lookup } => write!(f, "no {entity} object with {lookup}"),
            Self::NoMatch { entity, criteria } => {
                write!(f, "no {entity} found with the given criteria {criteria}")
            }
            Self::MultipleMatches {
                entity,
                criteria,
                count,
            } => write!(
                f,
                "{count} {entity} objects found with the given criteria {criteria}; expected one"
            ),
            Self::MissingParameter { operation, param } => {
                write!(f, "missing required argument '{param}' to '{operation}'")
            }
            Self::InvalidParameter {
                operation,
                param,
                reason,
            } => write!(f, "invalid argument '{param}' to '{operation}': {reason}"),
            Self::JobFailed {
                label,
                linode_id,
                job_id,
            } => write!(f, "job '{label}' ({job_id}) on Linode {linode_id} failed"),
            Self::Timeout {
                label,
                linode_id,
                timeout_secs,
            } => write!(
                f,
                "job '{label}' on Linode {linode_id} took longer than {timeout_secs} seconds to complete; aborting"
            ),
            Self::Unsupported { entity, operation } => {
                write!(f, "'{entity}' objects cannot be {operation} via the API")
            }
        }
    }
}

impl std::error::Error for LinodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

// The request URL carries the API key in its query string.
impl From<reqwest::Error> for LinodeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value.without_url())
    }
}

impl From<serde_json::Error> for LinodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value.to_string())
    }
}
