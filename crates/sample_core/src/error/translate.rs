//! Storage failure translation.
//!
//! # Responsibility
//! - Reduce every `rusqlite` failure to one structured outcome.
//! - Own all coupling to SQLite error codes and message text.
//!
//! # Invariants
//! - No raw driver error leaves this module.
//! - Anything unclassified is logged here and surfaces as `Internal`.
//!
//! SQLite does not report the violating column as a separate field; it is
//! recovered from `UNIQUE constraint failed: <table>.<column>[, ...]`. For
//! composite keys the last column is the one reported, since composite
//! uniqueness here is always parent-scoped.

use super::SampleError;
use crate::db::DbError;
use convert_case::{Case, Casing};
use log::error;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ffi;
use rusqlite::ErrorCode;

static UNIQUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"UNIQUE constraint failed: ([A-Za-z0-9_]+\.[A-Za-z0-9_]+(?:, [A-Za-z0-9_]+\.[A-Za-z0-9_]+)*)")
        .expect("valid unique constraint regex")
});

/// Translates a failure of a statement that is not a keyed single-row read.
pub fn database_error(err: rusqlite::Error) -> SampleError {
    if let Some(message) = unique_violation_message(&err) {
        return match parse_unique_target(message) {
            Some((table, field)) => SampleError::Conflict {
                table: table.to_string(),
                field: field.to_case(Case::Camel),
            },
            None => {
                error!(
                    "event=db_error module=error status=error error_code=unparsed_unique_violation error={err}"
                );
                SampleError::Internal
            }
        };
    }

    error!("event=db_error module=error status=error error_code=db_failure error={err}");
    SampleError::Internal
}

/// Translates a failure of a single-row read by identity.
///
/// No matching row means the resource is missing or soft-deleted.
pub fn resource_error(entity: &'static str, id: i64, err: rusqlite::Error) -> SampleError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => SampleError::NotFound { entity, id },
        other => database_error(other),
    }
}

/// Translates a failure of a version-guarded single-row write.
///
/// No matching row covers both a stale version and an already deleted row;
/// the two are deliberately reported the same way.
pub fn versioned_error(
    entity: &'static str,
    id: i64,
    attempted_version: i32,
    err: rusqlite::Error,
) -> SampleError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => SampleError::VersionConflict {
            entity,
            id,
            attempted_version,
        },
        other => database_error(other),
    }
}

impl From<DbError> for SampleError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => database_error(err),
            other => {
                error!("event=db_error module=error status=error error_code=db_unavailable error={other}");
                SampleError::Internal
            }
        }
    }
}

fn unique_violation_message(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
        {
            Some(message.as_deref().unwrap_or_default())
        }
        _ => None,
    }
}

/// Extracts `(table, column)` of the last key component.
fn parse_unique_target(message: &str) -> Option<(&str, &str)> {
    let columns = UNIQUE_RE.captures(message)?.get(1)?.as_str();
    columns.split(", ").last()?.split_once('.')
}
