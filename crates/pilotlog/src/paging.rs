//! Page requests and paged results.
//!
//! Sorting is restricted to a fixed set of column names per entity so that
//! the storage layer can splice the field into SQL without escaping.

use std::fmt;

use serde::Serialize;

use crate::config::PagingConfig;
use crate::error::{Error, Result};

/// Columns a flight listing may be sorted by.
pub const FLIGHT_SORT_FIELDS: &[&str] = &[
    "id",
    "callsign",
    "aircraft",
    "origin",
    "destination",
    "start_time",
    "end_time",
    "start_fuel",
    "end_fuel",
    "start_odometer",
    "end_odometer",
    "status",
];

/// Columns an airport listing may be sorted by.
pub const AIRPORT_SORT_FIELDS: &[&str] = &["code", "arrivals", "departures", "last"];

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    /// The SQL keyword for this direction.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A validated sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// Column name, always one of the whitelisted fields.
    pub field: &'static str,
    /// Direction.
    pub direction: Direction,
}

impl Sort {
    /// Sort ascending by `field`.
    #[must_use]
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    /// Sort descending by `field`.
    #[must_use]
    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    /// Parse `field` or `field,asc|desc`, accepting only names in `allowed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for unknown fields or directions.
    pub fn parse(value: &str, allowed: &[&'static str]) -> Result<Self> {
        let (name, direction) = match value.split_once(',') {
            Some((name, dir)) => (name.trim(), dir.trim()),
            None => (value.trim(), "asc"),
        };

        let field = allowed
            .iter()
            .copied()
            .find(|f| f.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_request(format!("unknown sort field: {name}")))?;

        let direction = if direction.eq_ignore_ascii_case("asc") {
            Direction::Asc
        } else if direction.eq_ignore_ascii_case("desc") {
            Direction::Desc
        } else {
            return Err(Error::invalid_request(format!(
                "unknown sort direction: {direction}"
            )));
        };

        Ok(Self { field, direction })
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_sql())
    }
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Number of items per page, never zero.
    pub size: u32,
    /// Sort order.
    pub sort: Sort,
}

impl PageRequest {
    /// Create a page request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `size` is zero.
    pub fn new(page: u32, size: u32, sort: Sort) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_request("page size must be greater than 0"));
        }
        Ok(Self { page, size, sort })
    }

    /// Build a page request from optional request parameters.
    ///
    /// A missing size falls back to the configured default; sizes above the
    /// configured maximum are clamped. A missing sort uses `default_sort`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a zero size or a bad sort.
    pub fn from_params(
        page: Option<u32>,
        size: Option<u32>,
        sort: Option<&str>,
        paging: &PagingConfig,
        allowed: &[&'static str],
        default_sort: Sort,
    ) -> Result<Self> {
        let size = size
            .unwrap_or(paging.default_page_size)
            .min(paging.max_page_size);
        let sort = match sort.filter(|s| !s.trim().is_empty()) {
            Some(value) => Sort::parse(value, allowed)?,
            None => default_sort,
        };
        Self::new(page.unwrap_or(0), size, sort)
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    /// Row limit for this page.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Zero-based page number.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
    /// Number of matching items across all pages.
    pub total_elements: u64,
    /// Number of pages needed for all matching items.
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from its content and the overall match count.
    #[must_use]
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size);
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Transform every item on the page.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging() -> PagingConfig {
        PagingConfig {
            default_page_size: 20,
            max_page_size: 100,
        }
    }

    #[test]
    fn test_sort_parse_field_only() {
        let sort = Sort::parse("callsign", FLIGHT_SORT_FIELDS).unwrap();
        assert_eq!(sort, Sort::asc("callsign"));
    }

    #[test]
    fn test_sort_parse_with_direction() {
        let sort = Sort::parse("START_TIME, DESC", FLIGHT_SORT_FIELDS).unwrap();
        assert_eq!(sort, Sort::desc("start_time"));
    }

    #[test]
    fn test_sort_parse_rejects_unknown_field() {
        let err = Sort::parse("wingspan", FLIGHT_SORT_FIELDS).unwrap_err();
        assert!(err.to_string().contains("wingspan"));
    }

    #[test]
    fn test_sort_parse_rejects_injection() {
        assert!(Sort::parse("code; DROP TABLE airports", AIRPORT_SORT_FIELDS).is_err());
    }

    #[test]
    fn test_sort_parse_rejects_unknown_direction() {
        let err = Sort::parse("code,sideways", AIRPORT_SORT_FIELDS).unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_sort_display() {
        assert_eq!(Sort::desc("last").to_string(), "last DESC");
    }

    #[test]
    fn test_page_request_rejects_zero_size() {
        assert!(PageRequest::new(0, 0, Sort::asc("code")).is_err());
    }

    #[test]
    fn test_from_params_defaults() {
        let request = PageRequest::from_params(
            None,
            None,
            None,
            &paging(),
            AIRPORT_SORT_FIELDS,
            Sort::asc("code"),
        )
        .unwrap();
        assert_eq!(request.page, 0);
        assert_eq!(request.size, 20);
        assert_eq!(request.sort, Sort::asc("code"));
    }

    #[test]
    fn test_from_params_clamps_size() {
        let request = PageRequest::from_params(
            Some(2),
            Some(10_000),
            Some("arrivals,desc"),
            &paging(),
            AIRPORT_SORT_FIELDS,
            Sort::asc("code"),
        )
        .unwrap();
        assert_eq!(request.size, 100);
        assert_eq!(request.offset(), 200);
        assert_eq!(request.sort, Sort::desc("arrivals"));
    }

    #[test]
    fn test_from_params_blank_sort_uses_default() {
        let request = PageRequest::from_params(
            None,
            None,
            Some(""),
            &paging(),
            FLIGHT_SORT_FIELDS,
            Sort::desc("start_time"),
        )
        .unwrap();
        assert_eq!(request.sort, Sort::desc("start_time"));
    }

    #[test]
    fn test_page_total_pages() {
        let request = PageRequest::new(0, 10, Sort::asc("code")).unwrap();

        assert_eq!(Page::<u8>::new(vec![], &request, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(vec![], &request, 10).total_pages, 1);
        assert_eq!(Page::<u8>::new(vec![], &request, 11).total_pages, 2);
    }

    #[test]
    fn test_page_map() {
        let request = PageRequest::new(1, 2, Sort::asc("code")).unwrap();
        let page = Page::new(vec![1, 2], &request, 4).map(|n| n * 10);
        assert_eq!(page.content, vec![10, 20]);
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 2);
    }
}
