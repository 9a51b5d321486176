//! Sample/translation repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Execute exactly one statement per call against `sample` or
//!   `sample_translation`.
//! - Route every storage failure through the error translator.
//!
//! # Invariants
//! - Writes that belong to a unit of work take the caller's transaction.
//! - Version-guarded writes match `id AND version AND deleted_at IS NULL`.
//! - Multi-row statements return rows in input order.

use crate::db::{Database, StatementParams, NOW_MS_SQL};
use crate::error::{database_error, resource_error, versioned_error, SampleError, SampleResult};
use crate::model::page::{PageRequest, SeekRequest};
use crate::model::sample::{Sample, SampleId, SampleRequest, Translation};
use log::error;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

const SAMPLE_ENTITY: &str = "sample";

const SAMPLE_COLUMNS: &str = "id,
    name,
    description,
    amount,
    version,
    created_at,
    created_by,
    last_modified_at,
    last_modified_by";

const TRANSLATION_COLUMNS: &str = "language, name, description, ordinal";

/// Case-insensitive name filter; `?1` is NULL when no query is given.
const NAME_FILTER_SQL: &str = "deleted_at IS NULL
    AND (?1 IS NULL OR instr(lower(name), lower(?1)) > 0)";

/// Repository interface for the sample aggregate.
pub trait SampleRepository {
    /// Handle the service opens its transactions on.
    fn database(&self) -> &Database;
    /// Inserts the root row and returns it with storage-assigned fields.
    fn save(&self, tx: &Transaction<'_>, request: &SampleRequest, actor: &str)
        -> SampleResult<Sample>;
    /// Loads one live root row, without translations.
    fn get(&self, id: SampleId) -> SampleResult<Sample>;
    /// Replaces scalar fields when the stored version matches.
    fn update(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        expected_version: i32,
        request: &SampleRequest,
        actor: &str,
    ) -> SampleResult<Sample>;
    /// Tombstones one row when the stored version matches.
    fn delete(&self, actor: &str, id: SampleId, expected_version: i32) -> SampleResult<()>;
    /// Inserts all translations in one statement.
    fn save_translations(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        translations: &[Translation],
    ) -> SampleResult<Vec<Translation>>;
    /// Loads all translations of one sample, ordered by ordinal.
    fn get_translations(&self, id: SampleId) -> SampleResult<Vec<Translation>>;
    /// Makes the stored translation set equal `translations`.
    fn reconcile_translations(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        translations: &[Translation],
    ) -> SampleResult<Vec<Translation>>;
    /// Lists live samples, newest first.
    fn list(&self, query: Option<&str>, page: &PageRequest) -> SampleResult<Vec<Sample>>;
    /// Counts live samples matching `query`.
    fn count(&self, query: Option<&str>) -> SampleResult<i64>;
    /// Lists up to `request.limit()` live samples after the cursor.
    fn seek(&self, query: Option<&str>, request: &SeekRequest) -> SampleResult<Vec<Sample>>;
}

/// SQLite-backed sample repository.
#[derive(Debug, Clone)]
pub struct SqliteSampleRepository {
    db: Database,
}

impl SqliteSampleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SampleRepository for SqliteSampleRepository {
    fn database(&self) -> &Database {
        &self.db
    }

    fn save(
        &self,
        tx: &Transaction<'_>,
        request: &SampleRequest,
        actor: &str,
    ) -> SampleResult<Sample> {
        let sql = format!(
            "INSERT INTO sample (name, description, amount, created_by, last_modified_by)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {SAMPLE_COLUMNS};"
        );
        tx.query_row(
            &sql,
            params![
                request.name,
                request.description,
                request.amount.to_string(),
                actor
            ],
            map_sample,
        )
        .map_err(database_error)
    }

    fn get(&self, id: SampleId) -> SampleResult<Sample> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {SAMPLE_COLUMNS}
             FROM sample
             WHERE id = ?1
               AND deleted_at IS NULL;"
        );
        conn.query_row(&sql, [id], map_sample)
            .map_err(|err| resource_error(SAMPLE_ENTITY, id, err))
    }

    fn update(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        expected_version: i32,
        request: &SampleRequest,
        actor: &str,
    ) -> SampleResult<Sample> {
        let sql = format!(
            "UPDATE sample
             SET
                name = ?3,
                description = ?4,
                amount = ?5,
                version = version + 1,
                last_modified_at = {NOW_MS_SQL},
                last_modified_by = ?6
             WHERE id = ?1
               AND version = ?2
               AND deleted_at IS NULL
             RETURNING {SAMPLE_COLUMNS};"
        );
        tx.query_row(
            &sql,
            params![
                id,
                expected_version,
                request.name,
                request.description,
                request.amount.to_string(),
                actor
            ],
            map_sample,
        )
        .map_err(|err| versioned_error(SAMPLE_ENTITY, id, expected_version, err))
    }

    fn delete(&self, actor: &str, id: SampleId, expected_version: i32) -> SampleResult<()> {
        let conn = self.db.connection()?;
        let sql = format!(
            "UPDATE sample
             SET
                deleted_at = {NOW_MS_SQL},
                deleted_by = ?3,
                version = version + 1,
                last_modified_at = {NOW_MS_SQL},
                last_modified_by = ?3
             WHERE id = ?1
               AND version = ?2
               AND deleted_at IS NULL;"
        );
        let changed = conn
            .execute(&sql, params![id, expected_version, actor])
            .map_err(database_error)?;

        if changed == 0 {
            return Err(SampleError::VersionConflict {
                entity: SAMPLE_ENTITY,
                id,
                attempted_version: expected_version,
            });
        }

        Ok(())
    }

    fn save_translations(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        translations: &[Translation],
    ) -> SampleResult<Vec<Translation>> {
        write_translations(tx, id, translations, "")
    }

    fn get_translations(&self, id: SampleId) -> SampleResult<Vec<Translation>> {
        let conn = self.db.connection()?;
        load_translations(&conn, id).map_err(database_error)
    }

    fn reconcile_translations(
        &self,
        tx: &Transaction<'_>,
        id: SampleId,
        translations: &[Translation],
    ) -> SampleResult<Vec<Translation>> {
        let mut params = StatementParams::new();
        let parent = params.bind(id);
        let mut sql = format!("DELETE FROM sample_translation WHERE sample_id = {parent}");
        if !translations.is_empty() {
            let kept = translations
                .iter()
                .map(|translation| params.bind(translation.language.clone()))
                .collect::<Vec<_>>();
            sql.push_str(&format!(" AND language NOT IN ({})", kept.join(", ")));
        }
        sql.push(';');
        tx.execute(&sql, params_from_iter(params.into_values()))
            .map_err(database_error)?;

        write_translations(
            tx,
            id,
            translations,
            " ON CONFLICT (sample_id, language) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                ordinal = excluded.ordinal",
        )
    }

    fn list(&self, query: Option<&str>, page: &PageRequest) -> SampleResult<Vec<Sample>> {
        let conn = self.db.connection()?;
        let sql = format!(
            "SELECT {SAMPLE_COLUMNS}
             FROM sample
             WHERE {NAME_FILTER_SQL}
             ORDER BY created_at DESC, id DESC
             LIMIT ?2 OFFSET ?3;"
        );
        let mut stmt = conn.prepare(&sql).map_err(database_error)?;
        let rows = stmt
            .query_map(params![query, page.size, page.offset], map_sample)
            .map_err(database_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(database_error)
    }

    fn count(&self, query: Option<&str>) -> SampleResult<i64> {
        let conn = self.db.connection()?;
        let sql = format!("SELECT COUNT(*) FROM sample WHERE {NAME_FILTER_SQL};");
        conn.query_row(&sql, params![query], |row| row.get(0))
            .map_err(database_error)
    }

    fn seek(&self, query: Option<&str>, request: &SeekRequest) -> SampleResult<Vec<Sample>> {
        let conn = self.db.connection()?;
        let (created_at, after_id) = request.cursor().unzip();
        let sql = format!(
            "SELECT {SAMPLE_COLUMNS}
             FROM sample
             WHERE {NAME_FILTER_SQL}
               AND (
                    ?2 IS NULL
                    OR created_at < ?2
                    OR (created_at = ?2 AND id < ?3)
               )
             ORDER BY created_at DESC, id DESC
             LIMIT ?4;"
        );
        let mut stmt = conn.prepare(&sql).map_err(database_error)?;
        let rows = stmt
            .query_map(
                params![query, created_at, after_id, request.limit()],
                map_sample,
            )
            .map_err(database_error)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(database_error)
    }
}

/// Inserts `translations` in one multi-row statement, with an optional
/// conflict clause, and returns the stored rows in input order.
fn write_translations(
    tx: &Transaction<'_>,
    id: SampleId,
    translations: &[Translation],
    on_conflict: &str,
) -> SampleResult<Vec<Translation>> {
    if translations.is_empty() {
        return Ok(Vec::new());
    }

    let mut params = StatementParams::new();
    let rows = translations
        .iter()
        .map(|translation| {
            params.bind_tuple([
                Value::Integer(id),
                Value::Text(translation.language.clone()),
                Value::Text(translation.name.clone()),
                translation.description.clone().map_or(Value::Null, Value::Text),
                Value::Integer(i64::from(translation.ordinal)),
            ])
        })
        .collect::<Vec<_>>();
    let sql = format!(
        "INSERT INTO sample_translation (sample_id, language, name, description, ordinal)
         VALUES {}{on_conflict}
         RETURNING {TRANSLATION_COLUMNS};",
        rows.join(", ")
    );

    let mut stmt = tx.prepare(&sql).map_err(database_error)?;
    let stored = stmt
        .query_map(params_from_iter(params.into_values()), map_translation)
        .map_err(database_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(database_error)?;

    in_input_order(id, translations, stored)
}

/// `RETURNING` order is not guaranteed; realign rows by language.
fn in_input_order(
    id: SampleId,
    input: &[Translation],
    stored: Vec<Translation>,
) -> SampleResult<Vec<Translation>> {
    let mut by_language = stored
        .into_iter()
        .map(|translation| (translation.language.clone(), translation))
        .collect::<HashMap<_, _>>();

    input
        .iter()
        .map(|translation| {
            by_language.remove(&translation.language).ok_or_else(|| {
                error!(
                    "event=translation_write module=repo status=error error_code=missing_returned_row sample_id={id}"
                );
                SampleError::Internal
            })
        })
        .collect()
}

fn load_translations(conn: &Connection, id: SampleId) -> rusqlite::Result<Vec<Translation>> {
    let sql = format!(
        "SELECT {TRANSLATION_COLUMNS}
         FROM sample_translation
         WHERE sample_id = ?1
         ORDER BY ordinal ASC, language ASC;"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([id], map_translation)?;
    rows.collect()
}

fn map_sample(row: &Row<'_>) -> rusqlite::Result<Sample> {
    Ok(Sample {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        amount: parse_amount(row)?,
        version: row.get("version")?,
        translations: Vec::new(),
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        last_modified_at: row.get("last_modified_at")?,
        last_modified_by: row.get("last_modified_by")?,
    })
}

fn map_translation(row: &Row<'_>) -> rusqlite::Result<Translation> {
    Ok(Translation {
        language: row.get("language")?,
        name: row.get("name")?,
        description: row.get("description")?,
        ordinal: row.get("ordinal")?,
    })
}

fn parse_amount(row: &Row<'_>) -> rusqlite::Result<Decimal> {
    let index = row.as_ref().column_index("amount")?;
    let text: String = row.get(index)?;
    Decimal::from_str(&text)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}
