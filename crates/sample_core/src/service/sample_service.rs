//! Sample aggregate service.
//!
//! # Responsibility
//! - Run the create/update protocols as single write transactions.
//! - Attach translations to reads and assemble pagination envelopes.
//!
//! # Invariants
//! - A transaction never outlives the call that opened it; early returns
//!   drop it, which rolls it back.
//! - Repository errors are propagated unchanged.
//! - `get` reads root and translations separately and may observe skew
//!   under concurrent writes.
//! - `list` totals come from an independent count and may be approximate.

use crate::db::begin_write;
use crate::error::message::normalize_language;
use crate::error::{database_error, SampleResult, STATUS_INTERNAL};
use crate::model::page::{Page, PageRequest, Seek, SeekRequest};
use crate::model::sample::{Sample, SampleId, SampleRequest, Translation};
use crate::repo::sample_repo::SampleRepository;
use log::{error, info, warn};
use std::time::Instant;

/// Use-case service wrapper for the sample aggregate.
pub struct SampleService<R: SampleRepository> {
    repo: R,
}

impl<R: SampleRepository> SampleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Inserts the root row and its full translation set atomically.
    pub fn create(&self, request: &SampleRequest, actor: &str) -> SampleResult<Sample> {
        observe("sample_create", || {
            let mut conn = self.repo.database().connection()?;
            let tx = begin_write(&mut conn).map_err(database_error)?;

            let mut sample = self.repo.save(&tx, request, actor)?;
            let translations =
                self.repo
                    .save_translations(&tx, sample.id, &request.translations)?;

            tx.commit().map_err(database_error)?;
            sample.translations = by_ordinal(translations);
            Ok(sample)
        })
    }

    /// Loads one live sample with its translations attached.
    pub fn get(&self, id: SampleId) -> SampleResult<Sample> {
        observe("sample_get", || {
            let mut sample = self.repo.get(id)?;
            sample.translations = self.repo.get_translations(id)?;
            Ok(sample)
        })
    }

    /// Loads one sample with its text replaced by one translation.
    ///
    /// Picks the translation in `language`, else the lowest ordinal. The
    /// root text is kept when there are no translations. The translation
    /// list itself is not attached.
    pub fn get_translated(&self, id: SampleId, language: &str) -> SampleResult<Sample> {
        observe("sample_get_translated", || {
            let mut sample = self.repo.get(id)?;
            let mut translations = self.repo.get_translations(id)?;
            let wanted = normalize_language(language);

            let chosen = translations
                .iter()
                .position(|translation| translation.language == wanted)
                .or_else(|| {
                    translations
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, translation)| translation.ordinal)
                        .map(|(index, _)| index)
                });
            if let Some(index) = chosen {
                sample.localize(translations.swap_remove(index));
            }
            Ok(sample)
        })
    }

    /// Replaces scalar fields and reconciles translations, guarded by
    /// `expected_version`.
    ///
    /// A stale version or a deleted row fails the whole update with no
    /// partial effect.
    pub fn update(
        &self,
        id: SampleId,
        expected_version: i32,
        request: &SampleRequest,
        actor: &str,
    ) -> SampleResult<Sample> {
        observe("sample_update", || {
            let mut conn = self.repo.database().connection()?;
            let tx = begin_write(&mut conn).map_err(database_error)?;

            let mut sample = self
                .repo
                .update(&tx, id, expected_version, request, actor)?;
            let translations = self
                .repo
                .reconcile_translations(&tx, id, &request.translations)?;

            tx.commit().map_err(database_error)?;
            sample.translations = by_ordinal(translations);
            Ok(sample)
        })
    }

    /// Soft-deletes one sample, guarded by `expected_version`.
    pub fn delete(&self, actor: &str, id: SampleId, expected_version: i32) -> SampleResult<()> {
        observe("sample_delete", || {
            self.repo.delete(actor, id, expected_version)
        })
    }

    /// Lists live samples whose name contains `query`, newest first.
    ///
    /// A blank query matches everything.
    pub fn list(&self, query: Option<&str>, page: &PageRequest) -> SampleResult<Page<Sample>> {
        observe("sample_list", || {
            let query = normalize_query(query);
            let data = self.repo.list(query, page)?;
            let total = self.repo.count(query)?;
            Ok(Page::new(data, total, page))
        })
    }

    /// Returns the keyset page after the request cursor.
    pub fn seek(&self, query: Option<&str>, request: &SeekRequest) -> SampleResult<Seek<Sample>> {
        observe("sample_seek", || {
            let rows = self.repo.seek(normalize_query(query), request)?;
            Ok(Seek::new(rows, request))
        })
    }
}

/// Runs one service operation and emits its outcome event.
fn observe<T>(event: &'static str, op: impl FnOnce() -> SampleResult<T>) -> SampleResult<T> {
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();

    match &result {
        Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
        Err(err) if err.status() >= STATUS_INTERNAL => error!(
            "event={event} module=service status=error error_code={} duration_ms={duration_ms}",
            err.code()
        ),
        Err(err) => warn!(
            "event={event} module=service status=rejected error_code={} duration_ms={duration_ms}",
            err.code()
        ),
    }
    result
}

fn normalize_query(query: Option<&str>) -> Option<&str> {
    query.map(str::trim).filter(|value| !value.is_empty())
}

fn by_ordinal(mut translations: Vec<Translation>) -> Vec<Translation> {
    translations.sort_by(|left, right| {
        left.ordinal
            .cmp(&right.ordinal)
            .then_with(|| left.language.cmp(&right.language))
    });
    translations
}
