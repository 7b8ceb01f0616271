//! Task, habit and project creation

use super::load_player;
use super::tree::TaskIndex;
use crate::error::{EngineError, Result};
use crate::gates;
use crate::progression::{calculate_xp, Attribute, AttributeWeights};
use crate::store::Repo;
use crate::types::{Difficulty, HabitInterval, TaskInsert, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Recurrence settings for a new habit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitSpec {
    pub interval: HabitInterval,
    /// Window length starting now; unset means the habit never ends
    pub duration: Option<Duration>,
    /// Completions inside the window that finish the habit
    pub goal: Option<u32>,
}

impl HabitSpec {
    pub fn new(interval: HabitInterval) -> Self {
        Self {
            interval,
            duration: None,
            goal: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_goal(mut self, goal: u32) -> Self {
        self.goal = Some(goal);
        self
    }
}

/// Input for a plain task or habit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub difficulty: Difficulty,
    /// Primary attribute, also the XP-bonus attribute
    pub attribute: Attribute,
    pub weights: Option<AttributeWeights>,
    pub parent_id: Option<i64>,
    pub habit: Option<HabitSpec>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, difficulty: Difficulty) -> Self {
        Self {
            title: title.into(),
            difficulty,
            attribute: Attribute::DEFAULT,
            weights: None,
            parent_id: None,
            habit: None,
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn weights(mut self, weights: Option<AttributeWeights>) -> Self {
        self.weights = weights;
        self
    }

    pub fn parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn habit(mut self, spec: HabitSpec) -> Self {
        self.habit = Some(spec);
        self
    }
}

/// Input for a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub attribute: Attribute,
    pub weights: Option<AttributeWeights>,
    pub parent_id: Option<i64>,
}

impl NewProject {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attribute: Attribute::DEFAULT,
            weights: None,
            parent_id: None,
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn weights(mut self, weights: Option<AttributeWeights>) -> Self {
        self.weights = weights;
        self
    }

    pub fn parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateResult {
    pub task_id: i64,
    /// The parent project left `planning` because of this child
    pub project_activated: bool,
}

fn normalize_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EngineError::Validation("title is required".to_string()));
    }
    Ok(title.to_string())
}

fn non_empty(weights: &Option<AttributeWeights>) -> Option<AttributeWeights> {
    weights.clone().filter(|w| !w.is_empty())
}

/// Parent must exist and the new node's depth must be allowed at `level`
fn check_parent(index: &TaskIndex, level: u32, parent_id: i64) -> Result<()> {
    if index.get(parent_id).is_none() {
        return Err(EngineError::TaskNotFound(parent_id));
    }
    let depth = index.depth(parent_id)? + 1;
    debug!("attaching under {} at depth {} (level {})", parent_id, depth, level);
    gates::can_attach_to_parent(level, depth)
}

/// Flip a planning project to active once it gets its first child
fn activate_parent(repo: &Repo<'_>, index: &TaskIndex, parent_id: Option<i64>) -> Result<bool> {
    let Some(parent) = parent_id.and_then(|id| index.get(id)) else {
        return Ok(false);
    };
    if !parent.is_project || parent.status != TaskStatus::Planning {
        return Ok(false);
    }
    repo.update_task_status(parent.id, TaskStatus::Active)?;
    info!("project {} activated", parent.id);
    Ok(true)
}

pub(super) fn create_task(repo: &Repo<'_>, input: &NewTask, now: DateTime<Utc>) -> Result<CreateResult> {
    let title = normalize_title(&input.title)?;
    let player = load_player(repo)?;

    gates::can_use_difficulty(player.level, input.difficulty)?;

    if let Some(spec) = &input.habit {
        gates::can_create_habit(player.level)?;
        if spec.goal == Some(0) {
            return Err(EngineError::Validation("habit goal must be at least 1".to_string()));
        }
    }

    let index = TaskIndex::build(repo.list_tasks()?);
    if let Some(parent_id) = input.parent_id {
        check_parent(&index, player.level, parent_id)?;
    }

    let limit = gates::max_active_tasks(player.level);
    if index.open_leaf_count() >= limit {
        return Err(EngineError::Capacity { limit });
    }

    let attr_level = player.attribute_level(input.attribute);
    let xp_value = calculate_xp(input.difficulty, attr_level);

    let habit = input.habit.as_ref();
    let habit_end_date = match habit.and_then(|h| h.duration) {
        Some(d) => Some(now.checked_add_signed(d).ok_or_else(|| {
            EngineError::Validation("habit duration runs past the latest supported date".to_string())
        })?),
        None => None,
    };
    let id = repo.insert_task(&TaskInsert {
        parent_id: input.parent_id,
        title,
        status: if habit.is_some() { TaskStatus::Active } else { TaskStatus::Pending },
        created_at: now,
        difficulty: input.difficulty,
        attribute: input.attribute,
        weights: non_empty(&input.weights),
        xp_value,
        is_project: false,
        is_habit: habit.is_some(),
        habit_interval: habit.map(|h| h.interval),
        habit_start_date: habit.and_then(|h| h.duration).map(|_| now),
        habit_end_date,
        habit_goal: habit.and_then(|h| h.goal),
    })?;

    let project_activated = activate_parent(repo, &index, input.parent_id)?;
    info!(
        "created {} {} ({} xp, difficulty {})",
        if habit.is_some() { "habit" } else { "task" },
        id,
        xp_value,
        input.difficulty
    );

    Ok(CreateResult {
        task_id: id,
        project_activated,
    })
}

pub(super) fn create_project(
    repo: &Repo<'_>,
    input: &NewProject,
    now: DateTime<Utc>,
) -> Result<CreateResult> {
    let title = normalize_title(&input.title)?;
    let player = load_player(repo)?;

    gates::can_create_project(player.level)?;

    let index = TaskIndex::build(repo.list_tasks()?);
    if let Some(parent_id) = input.parent_id {
        check_parent(&index, player.level, parent_id)?;
    }

    let id = repo.insert_task(&TaskInsert {
        parent_id: input.parent_id,
        title,
        status: TaskStatus::Planning,
        created_at: now,
        difficulty: Difficulty::Trivial,
        attribute: input.attribute,
        weights: non_empty(&input.weights),
        xp_value: 0,
        is_project: true,
        is_habit: false,
        habit_interval: None,
        habit_start_date: None,
        habit_end_date: None,
        habit_goal: None,
    })?;

    let project_activated = activate_parent(repo, &index, input.parent_id)?;
    info!("created project {}", id);

    Ok(CreateResult {
        task_id: id,
        project_activated,
    })
}
