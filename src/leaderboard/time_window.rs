//! Calendar-Month Contest Windows
//!
//! Every leaderboard is scoped to one UTC calendar month. The window covers the
//! whole contest month: `start` is the first instant of the month and `end` is
//! its last whole second (`23:59:59`), even when that instant is still in the
//! future.
//!
//! Windows are always derived from a caller-supplied `now` so a long-running
//! process tracks month boundaries instead of freezing the month it booted in.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// A closed UTC interval `[start, end]` spanning one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The calendar month containing `instant`.
    pub fn month_containing(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        let first_day = date - Duration::days(i64::from(date.day0()));
        let next_first = first_day
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self {
            start: first_day.and_time(NaiveTime::MIN).and_utc(),
            end: next_first.and_time(NaiveTime::MIN).and_utc() - Duration::seconds(1),
        }
    }

    /// The calendar month immediately before this one.
    pub fn preceding(&self) -> Self {
        Self::month_containing(self.start - Duration::seconds(1))
    }

    /// `YYYY-MM-DD` of the first day.
    pub fn start_date(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `YYYY-MM-DD` of the last day.
    pub fn end_date(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    pub fn start_iso(&self) -> String {
        iso_millis(self.start)
    }

    pub fn end_iso(&self) -> String {
        iso_millis(self.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Window for the month `now` falls in.
pub fn current_month_range(now: DateTime<Utc>) -> TimeWindow {
    TimeWindow::month_containing(now)
}

/// Window for the month before the one `now` falls in (January rolls back to December).
pub fn previous_month_range(now: DateTime<Utc>) -> TimeWindow {
    current_month_range(now).preceding()
}

/// Share of the window still ahead of `now`, in percent, clamped to `[0, 100]`
/// and rounded to two decimals.
pub fn percentage_left(window: &TimeWindow, now: DateTime<Utc>) -> f64 {
    let total_ms = window.duration().num_milliseconds();
    if total_ms <= 0 {
        return 0.0;
    }
    let elapsed_ms = (now - window.start).num_milliseconds();
    let left = (total_ms - elapsed_ms) as f64 / total_ms as f64 * 100.0;
    round2(left.clamp(0.0, 100.0))
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2025-10-01T00:00:00.000Z`.
pub fn iso_millis(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
