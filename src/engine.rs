//! Binds the calculators to a [`RecordStore`]. Every call reads fresh state
//! from the store and writes back in one step; callers that share an engine
//! serialize access through a lock around it. Reads are synchronous, writes
//! await the store.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::calendar::{Window, month_label, month_start, parse_time};
use crate::completion;
use crate::content;
use crate::errors::{EngineError, StoreError};
use crate::models::{
    AgeTier, CompletionRecord, EntryEdit, MissionStatement, NewEntry, Occurrence, PlannerEntry,
    Recurrence, ScopeKey, StreakSummary, TrackerMonth,
};
use crate::planner;
use crate::storage::{RecordKind, RecordStore, record_key};
use crate::streak;

pub struct ProgressEngine<S> {
    store: S,
}

impl<S: RecordStore> ProgressEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- habit tracker ---

    pub fn completion_dates(&self, scope: &ScopeKey) -> Result<BTreeSet<NaiveDate>, EngineError> {
        scope.validate()?;
        let records: Vec<CompletionRecord> = self.load(scope, RecordKind::Completion)?;
        Ok(records.into_iter().map(|record| record.date).collect())
    }

    /// Marks `date` done. Returns whether anything changed.
    pub async fn record_completion(
        &mut self,
        scope: &ScopeKey,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<bool, EngineError> {
        ensure_not_future(date, today)?;
        let mut dates = self.completion_dates(scope)?;
        if !dates.insert(date) {
            return Ok(false);
        }
        self.save_completions(scope, &dates).await?;
        info!(scope = %scope, %date, "completion recorded");
        Ok(true)
    }

    /// Un-marks `date`. Returns whether anything changed.
    pub async fn clear_completion(
        &mut self,
        scope: &ScopeKey,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<bool, EngineError> {
        ensure_not_future(date, today)?;
        let mut dates = self.completion_dates(scope)?;
        if !dates.remove(&date) {
            return Ok(false);
        }
        self.save_completions(scope, &dates).await?;
        info!(scope = %scope, %date, "completion cleared");
        Ok(true)
    }

    /// Flips `date` and returns whether it is now completed.
    pub async fn toggle_completion(
        &mut self,
        scope: &ScopeKey,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<bool, EngineError> {
        if self.completion_dates(scope)?.contains(&date) {
            self.clear_completion(scope, date, today).await?;
            Ok(false)
        } else {
            self.record_completion(scope, date, today).await?;
            Ok(true)
        }
    }

    pub fn streaks(&self, scope: &ScopeKey, today: NaiveDate) -> Result<StreakSummary, EngineError> {
        let dates = self.completion_dates(scope)?;
        Ok(streak::streaks(&dates, today))
    }

    pub fn completion_rate(
        &self,
        scope: &ScopeKey,
        month: NaiveDate,
        today: NaiveDate,
    ) -> Result<u8, EngineError> {
        let dates = self.completion_dates(scope)?;
        Ok(completion::completion_rate(&dates, month, today))
    }

    pub fn tracker_month(
        &self,
        scope: &ScopeKey,
        month: NaiveDate,
        today: NaiveDate,
    ) -> Result<TrackerMonth, EngineError> {
        let dates = self.completion_dates(scope)?;
        let streaks = streak::streaks(&dates, today);
        Ok(TrackerMonth {
            scope: *scope,
            month: month_label(month_start(month)),
            days: completion::month_days(&dates, month, today),
            current_streak: streaks.current,
            best_streak: streaks.best,
            completion_rate: completion::completion_rate(&dates, month, today),
        })
    }

    async fn save_completions(&mut self, scope: &ScopeKey, dates: &BTreeSet<NaiveDate>) -> Result<(), EngineError> {
        let records: Vec<CompletionRecord> = dates
            .iter()
            .map(|&date| CompletionRecord { scope: *scope, date })
            .collect();
        self.save(scope, RecordKind::Completion, &records).await
    }

    // --- planner ---

    /// Raw entries ordered by anchor date and time.
    pub fn list_entries(&self, scope: &ScopeKey) -> Result<Vec<PlannerEntry>, EngineError> {
        scope.validate()?;
        let mut entries: Vec<PlannerEntry> = self.load(scope, RecordKind::Planner)?;
        entries.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        Ok(entries)
    }

    /// Gives a planner scope that was never written the tier's sample items,
    /// dated within the week containing `today`. Returns whether it seeded.
    pub async fn seed_planner(&mut self, scope: &ScopeKey, today: NaiveDate) -> Result<bool, EngineError> {
        scope.validate()?;
        if self.store.contains(scope, RecordKind::Planner) {
            return Ok(false);
        }

        let week = Window::week_of(today)?;
        let entries = content::sample_activities(scope.tier())
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                let date = week
                    .start
                    .checked_add_days(Days::new(sample.day_offset))
                    .filter(|date| week.contains(*date))
                    .ok_or_else(|| {
                        EngineError::validation(format!("sample day {} is outside the week", sample.day_offset))
                    })?;
                let input = NewEntry {
                    date,
                    time: parse_time(sample.time)?,
                    activity: sample.activity.to_string(),
                    recurrence: Recurrence::None,
                };
                planner::new_entry(format!("sample-{index}"), *scope, input)
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        self.save(scope, RecordKind::Planner, &entries).await?;
        info!(scope = %scope, count = entries.len(), week = %week.start, "planner seeded with samples");
        Ok(true)
    }

    pub async fn add_entry(&mut self, scope: &ScopeKey, input: NewEntry) -> Result<PlannerEntry, EngineError> {
        scope.validate()?;
        let mut entries: Vec<PlannerEntry> = self.load(scope, RecordKind::Planner)?;
        let id = next_entry_id(&entries);
        let entry = planner::new_entry(id, *scope, input)?;

        entries.push(entry.clone());
        self.save(scope, RecordKind::Planner, &entries).await?;
        info!(scope = %scope, id = %entry.id, recurrence = %entry.recurrence, "planner entry added");
        Ok(entry)
    }

    pub async fn edit_entry(
        &mut self,
        scope: &ScopeKey,
        id: &str,
        edit: EntryEdit,
    ) -> Result<PlannerEntry, EngineError> {
        scope.validate()?;
        let mut entries: Vec<PlannerEntry> = self.load(scope, RecordKind::Planner)?;
        let entry = find_entry(&mut entries, id)?;
        planner::apply_edit(entry, edit)?;
        let updated = entry.clone();

        self.save(scope, RecordKind::Planner, &entries).await?;
        info!(scope = %scope, id, "planner entry edited");
        Ok(updated)
    }

    pub async fn delete_entry(&mut self, scope: &ScopeKey, id: &str) -> Result<(), EngineError> {
        scope.validate()?;
        let mut entries: Vec<PlannerEntry> = self.load(scope, RecordKind::Planner)?;
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        if entries.len() == before {
            return Err(EngineError::NotFound(format!("planner entry '{id}'")));
        }

        self.save(scope, RecordKind::Planner, &entries).await?;
        info!(scope = %scope, id, "planner entry deleted");
        Ok(())
    }

    pub fn list_occurrences(
        &self,
        scope: &ScopeKey,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Vec<Occurrence>, EngineError> {
        let window = Window::new(window_start, window_end)?;
        let entries = self.list_entries(scope)?;
        Ok(planner::project(&entries, &window))
    }

    /// Toggles the occurrence of `id` on `occurrence_date` and returns it.
    pub async fn toggle_occurrence(
        &mut self,
        scope: &ScopeKey,
        id: &str,
        occurrence_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Occurrence, EngineError> {
        scope.validate()?;
        let mut entries: Vec<PlannerEntry> = self.load(scope, RecordKind::Planner)?;
        let entry = find_entry(&mut entries, id)?;
        let completed = planner::toggle(entry, occurrence_date, today)?;
        let occurrence = Occurrence {
            entry_id: entry.id.clone(),
            date: occurrence_date,
            time: entry.time,
            activity: entry.activity.clone(),
            recurrence: entry.recurrence,
            completed,
        };

        self.save(scope, RecordKind::Planner, &entries).await?;
        info!(scope = %scope, id, date = %occurrence_date, completed, "occurrence toggled");
        Ok(occurrence)
    }

    // --- mission statement ---

    pub fn mission_statement(&self, tier: AgeTier) -> Result<MissionStatement, EngineError> {
        let scope = ScopeKey::general(tier);
        let mut records: Vec<MissionStatement> = self.load(&scope, RecordKind::Mission)?;
        Ok(records.pop().unwrap_or(MissionStatement {
            tier,
            statement: String::new(),
            updated_on: None,
        }))
    }

    pub async fn save_mission_statement(
        &mut self,
        tier: AgeTier,
        statement: &str,
        today: NaiveDate,
    ) -> Result<MissionStatement, EngineError> {
        let scope = ScopeKey::general(tier);
        let mission = MissionStatement {
            tier,
            statement: statement.trim_end().to_string(),
            updated_on: Some(today),
        };
        self.save(&scope, RecordKind::Mission, std::slice::from_ref(&mission)).await?;
        info!(%tier, chars = mission.statement.chars().count(), "mission statement saved");
        Ok(mission)
    }

    // --- store plumbing ---

    fn load<T: DeserializeOwned>(&self, scope: &ScopeKey, kind: RecordKind) -> Result<Vec<T>, EngineError> {
        let values = self.store.read(scope, kind)?;
        let records = values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|err| StoreError::Corrupt {
                key: record_key(scope, kind),
                reason: err.to_string(),
            })?;
        debug!(scope = %scope, kind = kind.prefix(), count = records.len(), "records loaded");
        Ok(records)
    }

    async fn save<T: Serialize>(&mut self, scope: &ScopeKey, kind: RecordKind, records: &[T]) -> Result<(), EngineError> {
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(StoreError::from)?;
        self.store.write(scope, kind, values).await?;
        Ok(())
    }
}

fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> Result<(), EngineError> {
    if date > today {
        return Err(EngineError::policy(format!(
            "cannot track {date}: it is after today ({today})"
        )));
    }
    Ok(())
}

fn find_entry<'a>(entries: &'a mut [PlannerEntry], id: &str) -> Result<&'a mut PlannerEntry, EngineError> {
    entries
        .iter_mut()
        .find(|entry| entry.id == id)
        .ok_or_else(|| EngineError::NotFound(format!("planner entry '{id}'")))
}

/// Millisecond timestamp ids, bumped past any id already in the scope.
fn next_entry_id(entries: &[PlannerEntry]) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let highest = entries
        .iter()
        .filter_map(|entry| entry.id.strip_prefix("item-")?.parse::<u128>().ok())
        .max()
        .unwrap_or(0);
    format!("item-{}", now.max(highest + 1))
}
