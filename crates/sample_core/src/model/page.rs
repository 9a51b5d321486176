//! Offset and keyset pagination envelopes.

use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalized offset pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub offset: i64,
}

impl PageRequest {
    /// Builds a request, defaulting absent or non-positive values.
    ///
    /// - `page`: defaults to 1.
    /// - `size`: defaults to 20, capped at 100.
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self::with_limits(page, size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Same as [`PageRequest::new`] with configured default and cap.
    pub fn with_limits(
        page: Option<i64>,
        size: Option<i64>,
        default_size: i64,
        max_size: i64,
    ) -> Self {
        let page = page.filter(|value| *value >= 1).unwrap_or(DEFAULT_PAGE);
        let size = size
            .filter(|value| *value >= 1)
            .unwrap_or(default_size)
            .min(max_size);
        Self {
            page,
            size,
            offset: page.saturating_sub(1).saturating_mul(size),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the total number of matches.
///
/// `total` comes from an independent count query and may drift from `data`
/// under concurrent writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        Self {
            data,
            page: request.page,
            size: request.size,
            total,
        }
    }
}

/// Keyset pagination parameters: rows strictly after `(created_at, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub size: i64,
    pub created_at: Option<i64>,
    pub id: Option<i64>,
}

impl SeekRequest {
    pub fn new(size: Option<i64>, created_at: Option<i64>, id: Option<i64>) -> Self {
        Self::with_limits(size, created_at, id, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Same as [`SeekRequest::new`] with configured default and cap.
    pub fn with_limits(
        size: Option<i64>,
        created_at: Option<i64>,
        id: Option<i64>,
        default_size: i64,
        max_size: i64,
    ) -> Self {
        let size = size
            .filter(|value| *value >= 1)
            .unwrap_or(default_size)
            .min(max_size);
        Self {
            size,
            created_at,
            id,
        }
    }

    /// Number of rows to fetch: one extra row signals another page.
    pub fn limit(&self) -> i64 {
        self.size + 1
    }

    /// Cursor only applies when both halves are present.
    pub fn cursor(&self) -> Option<(i64, i64)> {
        self.created_at.zip(self.id)
    }
}

/// Rows that can be positioned by a keyset cursor.
pub trait Seekable {
    fn created_at(&self) -> i64;
    fn id(&self) -> i64;
}

/// One keyset page; the cursor is empty on the last page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Seek<T> {
    pub data: Vec<T>,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl<T: Seekable> Seek<T> {
    /// Builds a page from up to `request.limit()` rows.
    pub fn new(mut data: Vec<T>, request: &SeekRequest) -> Self {
        let has_more = data.len() > usize::try_from(request.size).unwrap_or(usize::MAX);
        let (created_at, id) = if has_more {
            data.pop();
            data.last()
                .map(|last| (Some(last.created_at()), Some(last.id())))
                .unwrap_or((None, None))
        } else {
            (None, None)
        };

        Self {
            data,
            size: request.size,
            created_at,
            id,
        }
    }
}
