use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::calendar::{Window, month_end, month_start};
use crate::models::TrackerDay;

/// Elapsed portion of the month containing `month`: its first day through
/// today or the month's last day, whichever comes first. `None` when the
/// month has not started yet.
pub fn elapsed_window(month: NaiveDate, today: NaiveDate) -> Option<Window> {
    let start = month_start(month);
    let end = today.min(month_end(month));
    Window::new(start, end).ok()
}

/// Percentage of elapsed days in the month that have a completion.
pub fn completion_rate(dates: &BTreeSet<NaiveDate>, month: NaiveDate, today: NaiveDate) -> u8 {
    let Some(window) = elapsed_window(month, today) else {
        return 0;
    };
    let total = window.len_days();
    if total <= 0 {
        return 0;
    }

    let completed = dates.range(window.start..=window.end).count() as f64;
    (100.0 * completed / total as f64).round() as u8
}

/// Every day of the month with its tracker flags.
pub fn month_days(dates: &BTreeSet<NaiveDate>, month: NaiveDate, today: NaiveDate) -> Vec<TrackerDay> {
    Window::month_of(month)
        .days()
        .map(|date| TrackerDay {
            date,
            completed: dates.contains(&date),
            is_today: date == today,
            is_future: date > today,
        })
        .collect()
}
