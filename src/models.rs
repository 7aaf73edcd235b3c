use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

pub const MAX_HABIT_ID: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeTier {
    Kids,
    Teens,
    Adults,
}

impl AgeTier {
    pub const ALL: [AgeTier; 3] = [AgeTier::Kids, AgeTier::Teens, AgeTier::Adults];

    pub fn as_str(self) -> &'static str {
        match self {
            AgeTier::Kids => "kids",
            AgeTier::Teens => "teens",
            AgeTier::Adults => "adults",
        }
    }
}

impl fmt::Display for AgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeTier {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kids" => Ok(AgeTier::Kids),
            "teens" => Ok(AgeTier::Teens),
            "adults" => Ok(AgeTier::Adults),
            other => Err(EngineError::validation(format!("unknown age tier '{other}'"))),
        }
    }
}

/// Partition key for everything the engine stores: an age tier plus a habit
/// id, where habit 0 is the "general" scope shared by the tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeKey {
    tier: AgeTier,
    habit: u8,
}

impl ScopeKey {
    pub fn new(tier: AgeTier, habit: u8) -> Result<Self, EngineError> {
        let scope = Self { tier, habit };
        scope.validate()?;
        Ok(scope)
    }

    pub fn general(tier: AgeTier) -> Self {
        Self { tier, habit: 0 }
    }

    /// Parses the two path segments a caller addresses a scope with.
    pub fn parse(tier: &str, habit: &str) -> Result<Self, EngineError> {
        let tier = tier.parse::<AgeTier>()?;
        let habit = habit
            .trim()
            .parse::<u8>()
            .map_err(|_| EngineError::validation(format!("invalid habit id '{habit}'")))?;
        Self::new(tier, habit)
    }

    pub fn tier(&self) -> AgeTier {
        self.tier
    }

    pub fn habit(&self) -> u8 {
        self.habit
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.habit > MAX_HABIT_ID {
            return Err(EngineError::validation(format!(
                "habit id must be between 0 and {MAX_HABIT_ID}, got {}",
                self.habit
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tier, self.habit)
    }
}

impl TryFrom<String> for ScopeKey {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (tier, habit) = value
            .rsplit_once('-')
            .ok_or_else(|| EngineError::validation(format!("malformed scope '{value}'")))?;
        Self::parse(tier, habit)
    }
}

impl From<ScopeKey> for String {
    fn from(scope: ScopeKey) -> Self {
        scope.to_string()
    }
}

/// One day a habit was marked done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub scope: ScopeKey,
    pub date: NaiveDate,
}

/// A set of weekdays, stored as a bitmask with Monday in bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Weekdays(u8);

impl Weekdays {
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        days.into_iter().fold(Self(0), |set, day| set.with(day))
    }

    pub fn with(self, day: Weekday) -> Self {
        Self(self.0 | 1 << day.num_days_from_monday())
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|day| self.contains(*day))
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Which calendar dates a planner entry projects onto besides its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Fortnightly,
    Weekdays(Weekdays),
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::None => f.write_str("none"),
            Recurrence::Daily => f.write_str("daily"),
            Recurrence::Weekly => f.write_str("weekly"),
            Recurrence::Fortnightly => f.write_str("fortnightly"),
            Recurrence::Weekdays(days) => {
                let names: Vec<String> = days.iter().map(|day| day.to_string()).collect();
                f.write_str(&names.join("/"))
            }
        }
    }
}

impl FromStr for Recurrence {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "" | "none" => return Ok(Recurrence::None),
            "daily" => return Ok(Recurrence::Daily),
            "weekly" => return Ok(Recurrence::Weekly),
            "fortnightly" => return Ok(Recurrence::Fortnightly),
            // The planner's built-in shorthand.
            "m/w/f" => {
                return Ok(Recurrence::Weekdays(Weekdays::from_days([
                    Weekday::Mon,
                    Weekday::Wed,
                    Weekday::Fri,
                ])));
            }
            _ => {}
        }

        let mut days = Weekdays::default();
        for token in normalized.split(['/', ',']) {
            let day = token
                .trim()
                .parse::<Weekday>()
                .map_err(|_| EngineError::validation(format!("unknown recurrence '{value}'")))?;
            days = days.with(day);
        }
        if days.is_empty() {
            return Err(EngineError::validation(format!("unknown recurrence '{value}'")));
        }
        Ok(Recurrence::Weekdays(days))
    }
}

impl TryFrom<String> for Recurrence {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Recurrence> for String {
    fn from(recurrence: Recurrence) -> Self {
        recurrence.to_string()
    }
}

/// A scheduled activity. Completion is tracked per occurrence date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerEntry {
    pub id: String,
    pub scope: ScopeKey,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub activity: String,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub completed_on: BTreeSet<NaiveDate>,
}

/// One concrete calendar-date instance of a planner entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub entry_id: String,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub time: NaiveTime,
    pub activity: String,
    pub recurrence: Recurrence,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub weekday: String,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StreakSummary {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerDay {
    pub date: NaiveDate,
    pub completed: bool,
    pub is_today: bool,
    pub is_future: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerMonth {
    pub scope: ScopeKey,
    pub month: String,
    pub days: Vec<TrackerDay>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub completion_rate: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionStatement {
    pub tier: AgeTier,
    pub statement: String,
    pub updated_on: Option<NaiveDate>,
}

/// Input for a new planner entry, already parsed.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub activity: String,
    pub recurrence: Recurrence,
}

/// In-place edit of a planner entry; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct EntryEdit {
    pub time: Option<NaiveTime>,
    pub activity: Option<String>,
    pub recurrence: Option<Recurrence>,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlannerQuery {
    pub period: Option<String>,
    pub date: Option<String>,
    pub offset: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NewEntryRequest {
    pub date: String,
    pub time: String,
    pub activity: String,
    #[serde(default)]
    pub recurrence: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EditEntryRequest {
    pub time: Option<String>,
    pub activity: Option<String>,
    pub recurrence: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct MissionRequest {
    pub statement: String,
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub scope: ScopeKey,
    pub date: NaiveDate,
    pub completed: bool,
    pub current_streak: u32,
    pub best_streak: u32,
}

#[derive(Debug, Serialize)]
pub struct PlannerResponse {
    pub scope: ScopeKey,
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Serialize)]
pub struct PromptsResponse {
    pub tier: AgeTier,
    pub prompts: Vec<&'static str>,
}

/// Serde adapter keeping times as zero-padded `HH:MM` strings.
pub mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
