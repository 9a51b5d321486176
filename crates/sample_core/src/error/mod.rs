//! Structured error outcomes shared by every layer.
//!
//! # Responsibility
//! - Define the closed taxonomy every service call resolves to.
//! - Render outcomes into the serializable, localized response envelope.
//!
//! # Invariants
//! - `Internal` never carries driver or storage detail.
//! - Pointers are JSON-pointer-like paths in camelCase member naming.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod message;
pub mod translate;

pub use translate::{database_error, resource_error, versioned_error};

pub type SampleResult<T> = Result<T, SampleError>;

pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL: u16 = 500;

/// One violated rule on one request field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    /// Path from the request root, e.g. `/body/translations/0/name`.
    pub pointer: String,
    /// Name of the violated rule.
    pub code: &'static str,
    /// Rule parameter, reported as `meta.<code>` when present.
    pub param: Option<Value>,
}

/// Closed set of outcomes a service call can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    /// Storage uniqueness violation; `table` is the storage name, `field` is camelCase.
    #[error("duplicate value for {table}.{field}")]
    Conflict { table: String, field: String },
    /// Version-guarded write matched no row: stale version or row already gone.
    #[error("version conflict on {entity} {id}: attempted version {attempted_version}")]
    VersionConflict {
        entity: &'static str,
        id: i64,
        attempted_version: i32,
    },
    #[error("validation failed with {} violation(s)", .violations.len())]
    ValidationFailed {
        status: u16,
        violations: Vec<FieldViolation>,
    },
    #[error("internal error")]
    Internal,
}

impl SampleError {
    /// HTTP-like status associated with the outcome.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => STATUS_NOT_FOUND,
            Self::Conflict { .. } | Self::VersionConflict { .. } => STATUS_CONFLICT,
            Self::ValidationFailed { status, .. } => *status,
            Self::Internal => STATUS_INTERNAL,
        }
    }

    /// Stable error code used for logging and as the template key.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "duplicate",
            Self::VersionConflict { .. } => "version_conflict",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Internal => "server_internal",
        }
    }

    /// Renders the outcome into the wire envelope, with messages in `language`.
    pub fn to_response(&self, language: &str) -> ErrorResponse {
        let errors = match self {
            Self::NotFound { entity, id } => vec![ErrorDetail::new(
                Some(Value::from(*id)),
                "not_found",
                ErrorSource::pointer(format!("/data/{entity}/id")),
            )],
            Self::Conflict { table, field } => vec![ErrorDetail::new(
                None,
                "duplicate",
                ErrorSource::pointer(format!("/data/{table}/{field}")),
            )],
            Self::VersionConflict {
                entity,
                id,
                attempted_version,
            } => {
                let mut source = ErrorSource::pointer(format!("/data/{entity}/version"));
                source.meta = Some(BTreeMap::from([(
                    "version".to_string(),
                    Value::from(*attempted_version),
                )]));
                vec![ErrorDetail::new(
                    Some(Value::from(*id)),
                    "version_conflict",
                    source,
                )]
            }
            Self::ValidationFailed { violations, .. } => violations
                .iter()
                .map(|violation| {
                    let mut source = ErrorSource::pointer(violation.pointer.clone());
                    source.meta = violation
                        .param
                        .clone()
                        .map(|param| BTreeMap::from([(violation.code.to_string(), param)]));
                    ErrorDetail::new(None, violation.code, source)
                })
                .collect(),
            Self::Internal => vec![ErrorDetail::new(
                None,
                "server_internal",
                ErrorSource::pointer("/server".to_string()),
            )],
        };

        ErrorResponse {
            status: self.status(),
            errors,
        }
        .localized(language)
    }
}

/// Serializable error envelope handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub errors: Vec<ErrorDetail>,
}

impl ErrorResponse {
    /// Request body could not be decoded into the expected shape.
    pub fn invalid_body(language: &str) -> Self {
        Self {
            status: STATUS_BAD_REQUEST,
            errors: vec![ErrorDetail::new(
                None,
                "invalid",
                ErrorSource::pointer("/body".to_string()),
            )],
        }
        .localized(language)
    }

    fn localized(mut self, language: &str) -> Self {
        for detail in &mut self.errors {
            let field = detail.source.pointer.as_deref().and_then(field_name);
            detail.message = message::template(language, &detail.code, field);
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub source: ErrorSource,
}

impl ErrorDetail {
    fn new(id: Option<Value>, code: &str, source: ErrorSource) -> Self {
        Self {
            id,
            code: code.to_string(),
            message: None,
            source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

impl ErrorSource {
    fn pointer(pointer: String) -> Self {
        Self {
            pointer: Some(pointer),
            ..Self::default()
        }
    }
}

/// Last non-index segment of a pointer, used as the `{field}` template arg.
fn field_name(pointer: &str) -> Option<&str> {
    pointer
        .rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::{field_name, FieldViolation, SampleError};
    use serde_json::{json, Value};

    #[test]
    fn version_conflict_carries_attempted_version_and_id() {
        let err = SampleError::VersionConflict {
            entity: "sample",
            id: 5,
            attempted_version: 2,
        };
        let body = serde_json::to_value(err.to_response("en")).unwrap();

        assert_eq!(body["status"], json!(409));
        assert_eq!(body["errors"][0]["id"], json!(5));
        assert_eq!(body["errors"][0]["code"], json!("version_conflict"));
        assert_eq!(body["errors"][0]["source"]["pointer"], json!("/data/sample/version"));
        assert_eq!(body["errors"][0]["source"]["meta"]["version"], json!(2));
    }

    #[test]
    fn internal_response_exposes_no_detail() {
        let body = serde_json::to_value(SampleError::Internal.to_response("en")).unwrap();
        assert_eq!(body["status"], json!(500));
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["code"], json!("server_internal"));
        assert_eq!(body["errors"][0]["source"], json!({ "pointer": "/server" }));
    }

    #[test]
    fn validation_response_keeps_one_entry_per_violation() {
        let err = SampleError::ValidationFailed {
            status: 400,
            violations: vec![
                FieldViolation {
                    pointer: "/body/name".to_string(),
                    code: "required",
                    param: None,
                },
                FieldViolation {
                    pointer: "/body/translations/0/name".to_string(),
                    code: "max",
                    param: Some(Value::from(100)),
                },
            ],
        };
        let response = err.to_response("en");

        assert_eq!(response.status, 400);
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].source.meta, None);
        assert_eq!(
            response.errors[1].source.meta.as_ref().unwrap()["max"],
            Value::from(100)
        );
        assert_eq!(
            response.errors[0].message.as_deref(),
            Some("name is a required field")
        );
    }

    #[test]
    fn field_name_skips_index_segments() {
        assert_eq!(field_name("/body/translations/3/"), Some("translations"));
        assert_eq!(field_name("/body/translations/3/name"), Some("name"));
        assert_eq!(field_name("/"), None);
    }
}
