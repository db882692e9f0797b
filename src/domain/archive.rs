//! Calendar-month archive windows.
//!
//! An archive month is interpreted in the site timezone, so a post written at
//! 00:30 local time on the 1st lands in that month even when its UTC timestamp
//! still belongs to the previous one.

use chrono_tz::Tz;
use thiserror::Error;
use time::OffsetDateTime;

use crate::util::timezone;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("month `{month}` is outside 1..=12")]
    InvalidMonth { month: i64 },
    #[error("year `{year}` is outside {MIN_YEAR}..={MAX_YEAR}")]
    InvalidYear { year: i64 },
    #[error("month {year}-{month:02} has no representable start in {timezone}")]
    Unrepresentable {
        year: i32,
        month: u32,
        timezone: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveMonth {
    year: i32,
    month: u32,
}

impl ArchiveMonth {
    pub fn new(year: i64, month: i64) -> Result<Self, ArchiveError> {
        if !(1..=12).contains(&month) {
            return Err(ArchiveError::InvalidMonth { month });
        }
        if !(i64::from(MIN_YEAR)..=i64::from(MAX_YEAR)).contains(&year) {
            return Err(ArchiveError::InvalidYear { year });
        }

        Ok(Self {
            year: year as i32,
            month: month as u32,
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn path(&self) -> String {
        format!("/archives/{}/{}/", self.year, self.month)
    }

    /// Half-open UTC window `[start, end)` covering this month in `tz`.
    pub fn range_in(&self, tz: Tz) -> Result<MonthRange, ArchiveError> {
        let start = timezone::local_month_start(tz, self.year, self.month).ok_or(
            ArchiveError::Unrepresentable {
                year: self.year,
                month: self.month,
                timezone: tz.name(),
            },
        )?;

        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        // December 9999 ends past the supported calendar; leave it open.
        let end = timezone::local_month_start(tz, next_year, next_month);

        Ok(MonthRange { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: OffsetDateTime,
    pub end: Option<OffsetDateTime>,
}

impl MonthRange {
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        instant >= self.start && self.end.is_none_or(|end| instant < end)
    }
}
