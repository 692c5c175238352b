//! Date ranges, quick-range presets and day-boundary normalization.
//!
//! Filters hold UTC instants, but day boundaries are computed in the
//! operator's local offset: a "from" date is the first millisecond of its
//! local calendar day, a "to" date the last one.

use crate::error::ValidationError;
use crate::query::format_timestamp;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use std::fmt;
use std::str::FromStr;

/// Source of "now" for defaults and quick ranges.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock pinned to one instant, used by tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Both ends set.
    pub fn is_complete(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(ValidationError::DateOrder {
                from: format_timestamp(&from),
                to: format_timestamp(&to),
            }),
            _ => Ok(()),
        }
    }

    /// Whole local days covering `first..=last`.
    pub fn days(first: NaiveDate, last: NaiveDate, offset: &FixedOffset) -> Self {
        Self::new(
            day_boundary(first, DayBound::Start, offset),
            day_boundary(last, DayBound::End, offset),
        )
    }
}

/// First or last millisecond of `date` in `offset`, as a UTC instant.
pub fn day_boundary(date: NaiveDate, bound: DayBound, offset: &FixedOffset) -> DateTime<Utc> {
    let local = match bound {
        DayBound::Start => date.and_time(NaiveTime::MIN),
        DayBound::End => date
            .and_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or_else(|| date.and_time(NaiveTime::MIN)),
    };
    local_to_utc(local, offset)
}

fn local_to_utc(local: NaiveDateTime, offset: &FixedOffset) -> DateTime<Utc> {
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&(local - shift))
}

/// Parses a date control value (`YYYY-MM-DD` or an RFC 3339 timestamp) and
/// snaps it to the requested boundary of its local day.
pub fn parse_date_input(
    value: &str,
    bound: DayBound,
    offset: &FixedOffset,
) -> Result<DateTime<Utc>, ValidationError> {
    let trimmed = value.trim();
    let date = if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        date
    } else if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        ts.with_timezone(offset).date_naive()
    } else {
        return Err(ValidationError::invalid_value("date", value));
    };
    Ok(day_boundary(date, bound, offset))
}

/// Named presets offered as one-click date chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickRange {
    Today,
    ThisWeek,
    ThisMonth,
    ThisYear,
    LastMonth,
    LastTwoMonths,
}

impl QuickRange {
    pub const ALL: [QuickRange; 6] = [
        QuickRange::Today,
        QuickRange::ThisWeek,
        QuickRange::ThisMonth,
        QuickRange::ThisYear,
        QuickRange::LastMonth,
        QuickRange::LastTwoMonths,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuickRange::Today => "today",
            QuickRange::ThisWeek => "this-week",
            QuickRange::ThisMonth => "this-month",
            QuickRange::ThisYear => "this-year",
            QuickRange::LastMonth => "last-month",
            QuickRange::LastTwoMonths => "last-two-months",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuickRange::Today => "Today",
            QuickRange::ThisWeek => "This Week",
            QuickRange::ThisMonth => "This Month",
            QuickRange::ThisYear => "This Year",
            QuickRange::LastMonth => "Last Month",
            QuickRange::LastTwoMonths => "Last 2 Months",
        }
    }

    /// The range this preset covers, evaluated at `now` in `now`'s offset.
    ///
    /// Weeks run Monday to Sunday. "Last two months" starts on the first day
    /// of the month two months back and ends today.
    pub fn range(&self, now: &DateTime<FixedOffset>) -> DateRange {
        let offset = *now.offset();
        let today = now.date_naive();
        let month_start = first_of_month(today);
        let (first, last) = match self {
            QuickRange::Today => (today, today),
            QuickRange::ThisWeek => {
                let monday =
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
                (monday, monday + Duration::days(6))
            }
            QuickRange::ThisMonth => (month_start, last_of_month(month_start)),
            QuickRange::ThisYear => (
                month_start.with_month(1).unwrap_or(month_start),
                NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today),
            ),
            QuickRange::LastMonth => {
                let previous = month_start
                    .checked_sub_months(Months::new(1))
                    .unwrap_or(month_start);
                (previous, last_of_month(previous))
            }
            QuickRange::LastTwoMonths => (
                month_start
                    .checked_sub_months(Months::new(2))
                    .unwrap_or(month_start),
                today,
            ),
        };
        DateRange::days(first, last, &offset)
    }

    /// The first preset whose days match `range`, if any.
    pub fn detect(range: &DateRange, now: &DateTime<FixedOffset>) -> Option<QuickRange> {
        let offset = *now.offset();
        let (from, to) = (range.from?, range.to?);
        let from_day = from.with_timezone(&offset).date_naive();
        let to_day = to.with_timezone(&offset).date_naive();
        Self::ALL.into_iter().find(|preset| {
            let candidate = preset.range(now);
            candidate.from.map(|d| d.with_timezone(&offset).date_naive()) == Some(from_day)
                && candidate.to.map(|d| d.with_timezone(&offset).date_naive()) == Some(to_day)
        })
    }
}

impl fmt::Display for QuickRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for QuickRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == wanted)
            .ok_or_else(|| ValidationError::invalid_value("range", s))
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}
