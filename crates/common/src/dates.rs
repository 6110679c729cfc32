use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use serde::Serialize;

use crate::errors::DateError;

static DAY_FIRST: OnceLock<Regex> = OnceLock::new();
static ISO: OnceLock<Regex> = OnceLock::new();

fn day_first() -> &'static Regex {
    DAY_FIRST.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})(?:\s+(\d{1,2}):(\d{2}))?")
            .expect("day-first date pattern is valid")
    })
}

fn iso() -> &'static Regex {
    ISO.get_or_init(|| {
        Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})(?:[T\s](\d{2}):(\d{2}))?")
            .expect("ISO date pattern is valid")
    })
}

fn number(caps: &Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn time_of(caps: &Captures<'_>, hour: usize, minute: usize) -> NaiveTime {
    match (number(caps, hour), number(caps, minute)) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN),
        _ => NaiveTime::MIN,
    }
}

/// Find the first date (and optional `hh:mm` time) embedded in free text.
///
/// `dd/mm/yyyy` is tried first, then ISO `yyyy-mm-dd`. Matches that do not
/// form a real calendar date are skipped. A missing time means midnight.
pub fn extract_datetime(text: &str) -> Result<NaiveDateTime, DateError> {
    for caps in day_first().captures_iter(text) {
        let date = match (number(&caps, 1), number(&caps, 2), number(&caps, 3)) {
            (Some(day), Some(month), Some(year)) => {
                NaiveDate::from_ymd_opt(year as i32, month, day)
            }
            _ => None,
        };
        if let Some(date) = date {
            return Ok(date.and_time(time_of(&caps, 4, 5)));
        }
    }

    for caps in iso().captures_iter(text) {
        let date = match (number(&caps, 1), number(&caps, 2), number(&caps, 3)) {
            (Some(year), Some(month), Some(day)) => {
                NaiveDate::from_ymd_opt(year as i32, month, day)
            }
            _ => None,
        };
        if let Some(date) = date {
            return Ok(date.and_time(time_of(&caps, 4, 5)));
        }
    }

    Err(DateError::NotFound(text.to_string()))
}

pub fn extract_date(text: &str) -> Result<NaiveDate, DateError> {
    extract_datetime(text).map(|dt| dt.date())
}

/// Inclusive billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if start > end {
            return Err(DateError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        Self::new(extract_date(start)?, extract_date(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
