//! Page-number pagination.
//!
//! Pages are 1-based. The first page always exists, even for an empty result
//! set; any other page beyond the last one is out of range. The literal
//! `last` selects the final page.

use serde::Serialize;
use thiserror::Error;

pub const LAST_PAGE_TOKEN: &str = "last";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page `{0}` is not a positive integer")]
    InvalidPage(String),
    #[error("page {requested} is out of range (1..={num_pages})")]
    OutOfRange { requested: u64, num_pages: u64 },
}

/// Raw `page` query parameter after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    Number(u64),
    Last,
}

impl PageSelector {
    /// Missing or blank input selects page 1.
    pub fn parse(raw: Option<&str>) -> Result<Self, PaginationError> {
        let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Ok(Self::Number(1));
        };

        if value == LAST_PAGE_TOKEN {
            return Ok(Self::Last);
        }

        match value.parse::<u64>() {
            Ok(number) if number >= 1 => Ok(Self::Number(number)),
            _ => Err(PaginationError::InvalidPage(value.to_string())),
        }
    }
}

/// Offset/limit slice handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    pub fn for_page(number: u64, per_page: u64) -> Self {
        Self {
            offset: number.saturating_sub(1).saturating_mul(per_page),
            limit: per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: u64,
    total: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            per_page: per_page.max(1),
            total,
        }
    }

    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn resolve(&self, selector: PageSelector) -> Result<u64, PaginationError> {
        let num_pages = self.num_pages();
        match selector {
            PageSelector::Last => Ok(num_pages),
            PageSelector::Number(requested) if requested <= num_pages => Ok(requested),
            PageSelector::Number(requested) => Err(PaginationError::OutOfRange {
                requested,
                num_pages,
            }),
        }
    }

    pub fn meta(&self, number: u64) -> PageMeta {
        let num_pages = self.num_pages();
        PageMeta {
            number,
            num_pages,
            per_page: self.per_page,
            total: self.total,
            has_previous: number > 1,
            has_next: number < num_pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageMeta {
    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous.then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next.then(|| self.number + 1)
    }
}
