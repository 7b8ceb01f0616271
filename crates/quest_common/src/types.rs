//! Core domain types: difficulties, statuses, intervals and the persisted
//! records (player, task, completion, blueprint row).

use crate::error::{EngineError, Result};
use crate::progression::{attribute_level_for_xp, Attribute, AttributeWeights, AttributeXp};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the singleton player row
pub const MAIN_PLAYER_KEY: &str = "main_user";

// ============================================================================
// Difficulty
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Trivial = 1,
    Easy = 2,
    Medium = 3,
    Hard = 4,
    Epic = 5,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Difficulty::Trivial,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Epic,
    ];

    /// Parse a 1-5 value, rejecting anything else
    pub fn from_value(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Difficulty::Trivial),
            2 => Ok(Difficulty::Easy),
            3 => Ok(Difficulty::Medium),
            4 => Ok(Difficulty::Hard),
            5 => Ok(Difficulty::Epic),
            _ => Err(EngineError::Validation(format!("invalid difficulty: {}", value))),
        }
    }

    /// Stored values outside 1-5 are clamped rather than rejected
    pub fn from_stored(value: i64) -> Self {
        Self::from_value(value.clamp(1, 5)).unwrap_or(Difficulty::Trivial)
    }

    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Trivial => "Trivial",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Epic => "Epic",
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Trivial => 1.0,
            Difficulty::Easy => 2.0,
            Difficulty::Medium => 5.0,
            Difficulty::Hard => 10.0,
            Difficulty::Epic => 25.0,
        }
    }

    /// Next tier up, if any
    pub fn next(&self) -> Option<Self> {
        Self::from_value(self.value() as i64 + 1).ok()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

// ============================================================================
// Task status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Project with no children yet
    Planning,
    Pending,
    Active,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Planning => "planning",
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
        }
    }

    /// Unknown stored values read back as `Pending`
    pub fn parse_or_default(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "planning" => TaskStatus::Planning,
            "active" => TaskStatus::Active,
            "done" => TaskStatus::Done,
            _ => TaskStatus::Pending,
        }
    }

    /// Counts against the active-task limit
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Active)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Habit interval
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitInterval {
    Daily,
    Weekly,
    Monthly,
}

impl HabitInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitInterval::Daily => "daily",
            HabitInterval::Weekly => "weekly",
            HabitInterval::Monthly => "monthly",
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(HabitInterval::Daily),
            "weekly" => Ok(HabitInterval::Weekly),
            "monthly" => Ok(HabitInterval::Monthly),
            _ => Err(EngineError::Validation(format!(
                "invalid habit interval: {:?} (expected daily|weekly|monthly)",
                input
            ))),
        }
    }

    /// Due date one interval after `now`. Monthly steps clamp to the end of
    /// shorter months (Jan 31 -> Feb 28/29).
    pub fn next_due(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            HabitInterval::Daily => now + Duration::hours(24),
            HabitInterval::Weekly => now + Duration::days(7),
            HabitInterval::Monthly => now
                .checked_add_months(Months::new(1))
                .unwrap_or_else(|| now + Duration::days(30)),
        }
    }
}

impl fmt::Display for HabitInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parse a habit duration such as "7d", "2w" or "1m" (30-day months)
pub fn parse_habit_duration(input: &str) -> Result<Duration> {
    let s = input.trim();
    let invalid = || EngineError::Validation(format!("invalid habit duration: {:?}", input));

    let unit = s.chars().last().ok_or_else(invalid)?;
    let count: i64 = s[..s.len() - unit.len_utf8()].parse().map_err(|_| invalid())?;
    if count <= 0 {
        return Err(EngineError::Validation(format!(
            "habit duration must be positive: {:?}",
            input
        )));
    }

    let duration = match unit {
        'd' => Duration::try_days(count),
        'w' => Duration::try_weeks(count),
        'm' => count.checked_mul(30).and_then(Duration::try_days),
        _ => {
            return Err(EngineError::Validation(format!(
                "unknown duration unit {:?} (use d/w/m)",
                unit
            )))
        }
    };
    duration.ok_or_else(|| {
        EngineError::Validation(format!("habit duration out of range: {:?}", input))
    })
}

// ============================================================================
// Records
// ============================================================================

/// The singleton player record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub key: String,
    /// Cached, always equal to `level_for_total_xp(xp_total)` after a write
    pub level: u32,
    pub xp_total: u64,
    pub attributes: AttributeXp,
}

impl Player {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            level: 0,
            xp_total: 0,
            attributes: AttributeXp::default(),
        }
    }

    pub fn attribute_xp(&self, attr: Attribute) -> u64 {
        self.attributes.get(attr)
    }

    pub fn attribute_level(&self, attr: Attribute) -> u32 {
        attribute_level_for_xp(self.attributes.get(attr))
    }
}

/// One node of the task tree (plain task, project or habit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub difficulty: Difficulty,
    /// Primary attribute
    pub attribute: Attribute,
    pub weights: Option<AttributeWeights>,
    /// Frozen reward
    pub xp_value: u64,
    pub is_project: bool,
    pub is_habit: bool,
    pub habit_interval: Option<HabitInterval>,
    pub habit_start_date: Option<DateTime<Utc>>,
    pub habit_end_date: Option<DateTime<Utc>>,
    pub habit_goal: Option<u32>,
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        if self.is_project {
            TaskKind::Project
        } else if self.is_habit {
            TaskKind::Habit
        } else {
            TaskKind::Task
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Task,
    Project,
    Habit,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Task => "task",
            TaskKind::Project => "project",
            TaskKind::Habit => "habit",
        }
    }
}

/// Fields for inserting a task row
#[derive(Debug, Clone)]
pub struct TaskInsert {
    pub parent_id: Option<i64>,
    pub title: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub attribute: Attribute,
    pub weights: Option<AttributeWeights>,
    pub xp_value: u64,
    pub is_project: bool,
    pub is_habit: bool,
    pub habit_interval: Option<HabitInterval>,
    pub habit_start_date: Option<DateTime<Utc>>,
    pub habit_end_date: Option<DateTime<Utc>>,
    pub habit_goal: Option<u32>,
}

/// Append-only completion ledger row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub id: i64,
    pub task_id: i64,
    pub completed_at: DateTime<Utc>,
    /// Difficulty at completion time
    pub difficulty: Difficulty,
    /// Amount actually credited
    pub xp_awarded: u64,
}

// ============================================================================
// Blueprints
// ============================================================================

/// One-way blueprint lifecycle: locked -> available -> active -> completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlueprintStatus {
    Locked,
    Available,
    Active,
    Completed,
}

impl BlueprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlueprintStatus::Locked => "locked",
            BlueprintStatus::Available => "available",
            BlueprintStatus::Active => "active",
            BlueprintStatus::Completed => "completed",
        }
    }

    /// Unknown stored values read back as `Locked`
    pub fn parse_or_default(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "available" => BlueprintStatus::Available,
            "active" => BlueprintStatus::Active,
            "completed" => BlueprintStatus::Completed,
            _ => BlueprintStatus::Locked,
        }
    }
}

impl fmt::Display for BlueprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted blueprint state, keyed by catalog code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRow {
    pub code: String,
    pub status: BlueprintStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_difficulty_from_value() {
        assert_eq!(Difficulty::from_value(1).unwrap(), Difficulty::Trivial);
        assert_eq!(Difficulty::from_value(5).unwrap(), Difficulty::Epic);
        assert!(Difficulty::from_value(0).is_err());
        assert!(Difficulty::from_value(6).is_err());
        assert_eq!(Difficulty::from_stored(9), Difficulty::Epic);
        assert_eq!(Difficulty::from_stored(-3), Difficulty::Trivial);
        assert_eq!(Difficulty::Hard.next(), Some(Difficulty::Epic));
        assert_eq!(Difficulty::Epic.next(), None);
    }

    #[test]
    fn test_status_parse_or_default() {
        assert_eq!(TaskStatus::parse_or_default("DONE"), TaskStatus::Done);
        assert_eq!(TaskStatus::parse_or_default("weird"), TaskStatus::Pending);
        assert_eq!(BlueprintStatus::parse_or_default("weird"), BlueprintStatus::Locked);
        assert!(TaskStatus::Active.is_open());
        assert!(!TaskStatus::Planning.is_open());
    }

    #[test]
    fn test_interval_next_due() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        assert_eq!(HabitInterval::Daily.next_due(now), now + Duration::hours(24));
        assert_eq!(HabitInterval::Weekly.next_due(now), now + Duration::days(7));
        assert_eq!(
            HabitInterval::Monthly.next_due(now),
            Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_interval_parse() {
        assert_eq!(HabitInterval::parse(" Weekly ").unwrap(), HabitInterval::Weekly);
        assert!(HabitInterval::parse("hourly").is_err());
        assert!(HabitInterval::parse("").is_err());
    }

    #[test]
    fn test_parse_habit_duration() {
        assert_eq!(parse_habit_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_habit_duration("2w").unwrap(), Duration::days(14));
        assert_eq!(parse_habit_duration("1m").unwrap(), Duration::days(30));
        assert!(parse_habit_duration("0d").is_err());
        assert!(parse_habit_duration("d").is_err());
        assert!(parse_habit_duration("5y").is_err());
        assert!(parse_habit_duration("").is_err());
    }

    #[test]
    fn test_parse_habit_duration_out_of_range() {
        for input in ["999999999999999d", "999999999999999w", "999999999999999999m"] {
            let err = parse_habit_duration(input).unwrap_err();
            assert!(
                matches!(err, EngineError::Validation(_)),
                "{} should be rejected, got {:?}",
                input,
                err
            );
        }
        assert_eq!(parse_habit_duration("100000000d").unwrap(), Duration::days(100_000_000));
    }
}
