//! Normalization of the `GET /items` query string into a [`ListQuery`].
//!
//! Only an over-long `q` is rejected. Every other malformed or out-of-range
//! value silently falls back to a default or is clamped.

use crate::dtos::ListItemsParams;
use mongodb::bson::{doc, Document};
use service_core::error::AppError;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1000;
/// Longest accepted `q`, counted in characters.
pub const MAX_QUERY_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Name,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Anything outside the whitelist falls back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("name") => SortField::Name,
            _ => SortField::CreatedAt,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    /// MongoDB sort direction.
    pub fn direction(self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Literal, case-insensitive name prefix. `None` matches everything.
    pub name_prefix: Option<String>,
    pub limit: i64,
    pub skip: u64,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            name_prefix: None,
            limit: DEFAULT_LIMIT,
            skip: 0,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    pub fn from_params(params: &ListItemsParams) -> Result<Self, AppError> {
        let name_prefix = match params.q.as_deref() {
            Some(q) if q.chars().count() > MAX_QUERY_LEN => {
                return Err(AppError::BadRequest(anyhow::anyhow!("q too long")));
            }
            Some("") | None => None,
            Some(q) => Some(q.to_string()),
        };

        let limit = parse_clamped(params.limit.as_deref(), DEFAULT_LIMIT, MAX_LIMIT);
        let page = parse_clamped(params.page.as_deref(), 1, MAX_PAGE);

        Ok(Self {
            name_prefix,
            limit,
            // Both factors are clamped positive, so the product fits.
            skip: ((page - 1) * limit) as u64,
            sort: SortField::parse(params.sort.as_deref()),
            order: SortOrder::parse(params.order.as_deref()),
        })
    }

    /// Anchored regex source for `name_prefix` with every metacharacter
    /// escaped, e.g. `a.b*` becomes `^a\.b\*`.
    pub fn name_pattern(&self) -> Option<String> {
        self.name_prefix
            .as_deref()
            .map(|prefix| format!("^{}", regex::escape(prefix)))
    }

    pub fn filter(&self) -> Document {
        match self.name_pattern() {
            Some(pattern) => doc! { "name": { "$regex": pattern, "$options": "i" } },
            None => doc! {},
        }
    }

    /// Sort on the requested field, then `_id` in the same direction so
    /// pages over equal keys do not overlap.
    pub fn sort_document(&self) -> Document {
        let direction = self.order.direction();
        let mut sort = Document::new();
        sort.insert(self.sort.as_str(), direction);
        sort.insert("_id", direction);
        sort
    }
}

/// Parse an integer and clamp it into `[1, max]`; unparsable input yields `default`.
fn parse_clamped(raw: Option<&str>, default: i64, max: i64) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .map(|n| n.clamp(1, max))
        .unwrap_or(default)
}
