//! Page/limit pagination and sort direction utilities.

use serde::{Deserialize, Serialize};

/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// Sort direction accepted by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parses a user-supplied direction, falling back to the default.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()) {
            Some(v) if v == "ASC" => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }
}

/// Resolved pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageWindow {
    /// Return every row.
    All,
    /// Return `limit` rows starting at `offset`.
    Page { page: i64, limit: i64, offset: i64 },
}

impl PageWindow {
    /// Resolves raw query parameters. Non-positive values fall back to
    /// defaults, `limit` is clamped to [`MAX_PAGE_SIZE`] and the offset
    /// saturates for huge pages.
    pub fn resolve(page: Option<i64>, limit: Option<i64>, all: bool) -> Self {
        if all {
            return PageWindow::All;
        }
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        PageWindow::Page {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }

    /// `(limit, offset)` for SQL; `None` when every row is requested.
    pub fn limit_offset(&self) -> Option<(i64, i64)> {
        match self {
            PageWindow::All => None,
            PageWindow::Page { limit, offset, .. } => Some((*limit, *offset)),
        }
    }
}

/// Pagination metadata returned alongside list results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub all: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<SortDirection>,
}

impl PageMeta {
    pub fn new(total: i64, window: PageWindow, sort_by: &str, sort_dir: SortDirection) -> Self {
        let (all, page, limit) = match window {
            PageWindow::All => (true, None, None),
            PageWindow::Page { page, limit, .. } => (false, Some(page), Some(limit)),
        };
        Self {
            total,
            all,
            page,
            limit,
            sort_by: Some(sort_by.to_string()),
            sort_dir: Some(sort_dir),
        }
    }
}

/// Picks `requested` if it appears in `allowed`, else `default`.
///
/// Sort columns are interpolated into SQL, so only whitelisted names pass.
pub fn whitelist_sort<'a>(
    requested: Option<&str>,
    allowed: &[&'a str],
    default: &'a str,
) -> &'a str {
    requested
        .map(str::trim)
        .and_then(|r| allowed.iter().copied().find(|a| *a == r))
        .unwrap_or(default)
}
