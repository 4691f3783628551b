//! Read-only helpers for rendering a month of the calendar.

use chrono::{Datelike, NaiveDate};
use postdeck_domain::{DateKey, DayCalendar, ValidationError};
use serde::Serialize;

/// Monday-first grid for a month. Leading and trailing cells outside the
/// month are `None`; the length is always a multiple of seven.
pub fn month_grid(year: i32, month: u32) -> Result<Vec<Option<DateKey>>, ValidationError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ValidationError::InvalidDateKey(format!("{year}-{month:02}")))?;
    let leading = first.weekday().num_days_from_monday() as usize;

    let mut cells: Vec<Option<DateKey>> = vec![None; leading];
    let mut next = Some(first);
    while let Some(day) = next.filter(|d| d.month() == month) {
        cells.push(Some(DateKey::new(day)));
        next = day.succ_opt();
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    Ok(cells)
}

/// Per-day counts shown in a calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: DateKey,
    pub total: usize,
    pub posted: usize,
}

/// Summaries for every non-empty day of `year`/`month`, in date order.
pub fn month_summary(calendar: &DayCalendar, year: i32, month: u32) -> Vec<DaySummary> {
    calendar
        .values()
        .filter(|day| day.date.year() == year && day.date.month() == month)
        .map(|day| DaySummary { date: day.date, total: day.items.len(), posted: day.posted_count() })
        .collect()
}
