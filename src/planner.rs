//! Projection of planner entries onto calendar windows, and the rules for
//! adding, editing and completing them. Everything here works on plain
//! slices; persistence lives in the engine.

use chrono::{Datelike, NaiveDate};

use crate::calendar::Window;
use crate::errors::EngineError;
use crate::models::{DayPlan, EntryEdit, NewEntry, Occurrence, PlannerEntry, Recurrence, ScopeKey};

pub const TODAY_ONLY: &str = "You can only mark tasks as complete for today.";

/// Dates inside `window` on which `entry` occurs, ascending.
pub fn occurrence_dates(entry: &PlannerEntry, window: &Window) -> Vec<NaiveDate> {
    let anchor = entry.date;
    if anchor > window.end {
        return Vec::new();
    }

    match entry.recurrence {
        Recurrence::None => {
            if window.contains(anchor) {
                vec![anchor]
            } else {
                Vec::new()
            }
        }
        Recurrence::Daily => from_anchor(anchor, window).collect(),
        Recurrence::Weekly => every_n_days(anchor, window, 7),
        Recurrence::Fortnightly => every_n_days(anchor, window, 14),
        Recurrence::Weekdays(days) => {
            from_anchor(anchor, window)
                .filter(|date| days.contains(date.weekday()))
                .collect()
        }
    }
}

fn from_anchor(anchor: NaiveDate, window: &Window) -> impl Iterator<Item = NaiveDate> + use<> {
    let start = anchor.max(window.start);
    Window { start, end: window.end }.days()
}

fn every_n_days(anchor: NaiveDate, window: &Window, step: i64) -> Vec<NaiveDate> {
    let behind = (window.start - anchor).num_days().max(0);
    // First multiple of `step` at or after the window start.
    let skip = (behind + step - 1) / step * step;
    let Some(first) = anchor.checked_add_signed(chrono::Duration::days(skip)) else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    let mut cursor = first;
    while cursor <= window.end {
        dates.push(cursor);
        match cursor.checked_add_signed(chrono::Duration::days(step)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    dates
}

pub fn is_occurrence(entry: &PlannerEntry, date: NaiveDate) -> bool {
    occurrence_dates(entry, &Window { start: date, end: date }).contains(&date)
}

/// All occurrences in the window, ordered by date then time.
pub fn project(entries: &[PlannerEntry], window: &Window) -> Vec<Occurrence> {
    let mut occurrences: Vec<Occurrence> = entries
        .iter()
        .flat_map(|entry| {
            occurrence_dates(entry, window)
                .into_iter()
                .map(move |date| Occurrence {
                    entry_id: entry.id.clone(),
                    date,
                    time: entry.time,
                    activity: entry.activity.clone(),
                    recurrence: entry.recurrence,
                    completed: entry.completed_on.contains(&date),
                })
        })
        .collect();

    occurrences.sort_by(|a, b| {
        (a.date, a.time, &a.entry_id).cmp(&(b.date, b.time, &b.entry_id))
    });
    occurrences
}

/// One bucket per day of the window, empty days included.
pub fn group_by_day(window: &Window, occurrences: Vec<Occurrence>) -> Vec<DayPlan> {
    let mut days: Vec<DayPlan> = window
        .days()
        .map(|date| DayPlan {
            date,
            weekday: date.format("%A").to_string(),
            occurrences: Vec::new(),
        })
        .collect();

    for occurrence in occurrences {
        let index = (occurrence.date - window.start).num_days();
        if let Some(day) = usize::try_from(index).ok().and_then(|i| days.get_mut(i)) {
            day.occurrences.push(occurrence);
        }
    }
    days
}

pub fn new_entry(id: String, scope: ScopeKey, input: NewEntry) -> Result<PlannerEntry, EngineError> {
    let activity = validate_activity(&input.activity)?;
    Ok(PlannerEntry {
        id,
        scope,
        date: input.date,
        time: input.time,
        activity,
        recurrence: input.recurrence,
        completed_on: Default::default(),
    })
}

/// Applies an edit in place. Identity and past completions are kept.
pub fn apply_edit(entry: &mut PlannerEntry, edit: EntryEdit) -> Result<(), EngineError> {
    let activity = edit.activity.as_deref().map(validate_activity).transpose()?;

    if let Some(time) = edit.time {
        entry.time = time;
    }
    if let Some(activity) = activity {
        entry.activity = activity;
    }
    if let Some(recurrence) = edit.recurrence {
        entry.recurrence = recurrence;
    }
    Ok(())
}

/// Flips completion of the occurrence on `date`. Only today's occurrence
/// may be toggled. Returns the new completion state.
pub fn toggle(entry: &mut PlannerEntry, date: NaiveDate, today: NaiveDate) -> Result<bool, EngineError> {
    if date != today {
        return Err(EngineError::policy(TODAY_ONLY));
    }
    if !is_occurrence(entry, date) {
        return Err(EngineError::validation(format!(
            "entry {} does not occur on {date}",
            entry.id
        )));
    }

    if entry.completed_on.remove(&date) {
        Ok(false)
    } else {
        entry.completed_on.insert(date);
        Ok(true)
    }
}

fn validate_activity(raw: &str) -> Result<String, EngineError> {
    let activity = raw.trim();
    if activity.is_empty() {
        return Err(EngineError::validation("activity text must not be empty"));
    }
    Ok(activity.to_string())
}
