//! Habit recurrence, decay and goal tracking

use super::complete::{record_award, Award};
use crate::error::{EngineError, Result};
use crate::progression::{habit_reward, HABIT_DECAY_WINDOW_DAYS};
use crate::store::Repo;
use crate::types::{Player, Task, TaskCompletion};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Progress of a habit through its goal window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitProgress {
    /// Completions inside `[start, end]`
    pub completions: u32,
    pub goal: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub completed: bool,
    /// The window closed without reaching the goal
    pub expired: bool,
}

impl HabitProgress {
    /// The window starts at `habit_start_date`, or at creation when unset
    pub fn compute(task: &Task, completions: &[TaskCompletion], now: DateTime<Utc>) -> Self {
        let start = task.habit_start_date.unwrap_or(task.created_at);
        let end = task.habit_end_date;

        let count = completions
            .iter()
            .filter(|c| c.completed_at >= start)
            .filter(|c| end.map_or(true, |end| c.completed_at <= end))
            .count() as u32;

        let completed = task.habit_goal.is_some_and(|goal| count >= goal);
        let expired = !completed && end.is_some_and(|end| now > end);

        Self {
            completions: count,
            goal: task.habit_goal,
            start_date: task.habit_start_date,
            end_date: end,
            completed,
            expired,
        }
    }
}

pub(super) fn complete_habit(
    repo: &Repo<'_>,
    task: &Task,
    player: &mut Player,
    now: DateTime<Utc>,
) -> Result<Award> {
    if repo.count_children(task.id)? > 0 {
        return Err(EngineError::NotLeaf(task.id));
    }
    let interval = task
        .habit_interval
        .ok_or(EngineError::HabitMissingInterval(task.id))?;

    let since = now - Duration::days(HABIT_DECAY_WINDOW_DAYS);
    let recent = repo.count_completions_since(task.id, task.difficulty, since)?;
    let xp = habit_reward(task.xp_value, recent);
    debug!(
        "habit {}: {} recent completions at difficulty {}, awarding {}",
        task.id, recent, task.difficulty, xp
    );

    repo.reschedule_habit(task.id, now, interval.next_due(now))?;
    record_award(repo, task, player, xp, now)?;

    let mut habit_completed = false;
    if task.habit_goal.is_some() {
        let completions = repo.list_completions(task.id)?;
        if HabitProgress::compute(task, &completions, now).completed {
            repo.mark_task_done(task.id, now)?;
            habit_completed = true;
            info!("habit {} reached its goal", task.id);
        }
    }

    Ok(Award {
        xp,
        project_volume: None,
        habit_completed,
    })
}
