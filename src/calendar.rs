use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime};
use std::str::FromStr;

use crate::errors::EngineError;

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Week,
    Month,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            other => Err(EngineError::validation(format!("unknown period '{other}'"))),
        }
    }
}

impl Window {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EngineError> {
        if end < start {
            return Err(EngineError::validation(format!(
                "window end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Sunday through Saturday around `date`. Fails when that week runs
    /// past the representable date range.
    pub fn week_of(date: NaiveDate) -> Result<Self, EngineError> {
        week_start(date)
            .and_then(|start| Some(Self { start, end: start.checked_add_signed(Duration::days(6))? }))
            .ok_or_else(|| EngineError::validation(format!("the week of {date} is out of range")))
    }

    pub fn month_of(date: NaiveDate) -> Self {
        let start = month_start(date);
        Self {
            start,
            end: month_end(start),
        }
    }

    pub fn of(period: Period, date: NaiveDate) -> Result<Self, EngineError> {
        match period {
            Period::Week => Self::week_of(date),
            Period::Month => Ok(Self::month_of(date)),
        }
    }

    /// The window `offset` periods away from the one containing `date`.
    pub fn shifted(period: Period, date: NaiveDate, offset: i32) -> Result<Self, EngineError> {
        let anchor = match period {
            Period::Week => date.checked_add_signed(Duration::weeks(i64::from(offset))),
            Period::Month => {
                let first = month_start(date);
                let months = Months::new(offset.unsigned_abs());
                if offset >= 0 {
                    first.checked_add_months(months)
                } else {
                    first.checked_sub_months(months)
                }
            }
        }
        .ok_or_else(|| EngineError::validation(format!("offset {offset} is out of range")))?;
        Self::of(period, anchor)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        std::iter::successors(Some(self.start), |day| day.succ_opt()).take_while(move |day| *day <= end)
    }
}

/// The Sunday on or before `date`, if representable.
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(i64::from(date.weekday().num_days_from_sunday())))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    [31, 30, 29, 28]
        .into_iter()
        .find_map(|day| date.with_day(day))
        .unwrap_or(date)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("malformed date '{raw}', expected YYYY-MM-DD")))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate, EngineError> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| EngineError::validation(format!("malformed month '{raw}', expected YYYY-MM")))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, EngineError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| EngineError::validation(format!("malformed time '{raw}', expected HH:MM")))
}

pub fn month_label(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
