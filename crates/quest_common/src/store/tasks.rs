//! Task tree repository

use super::{parse_opt_ts, parse_ts, ts, xp_from_sql, xp_to_sql, Repo};
use crate::error::{EngineError, Result};
use crate::progression::{Attribute, AttributeWeights};
use crate::types::{Difficulty, HabitInterval, Task, TaskInsert, TaskStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

const TASK_COLUMNS: &str = "id, parent_id, title, description, status, created_at, completed_at, \
                            due_date, difficulty, attribute, attributes, xp_value, is_project, \
                            is_habit, habit_interval, habit_start_date, habit_end_date, habit_goal";

fn weights_to_sql(weights: Option<&AttributeWeights>) -> Result<Option<String>> {
    match weights.filter(|w| !w.is_empty()) {
        Some(w) => Ok(Some(serde_json::to_string(&w.to_codes())?)),
        None => Ok(None),
    }
}

fn weights_from_sql(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<AttributeWeights>> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let codes: BTreeMap<String, u32> = serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))?;
    let weights = AttributeWeights::from_codes(&codes);
    Ok((!weights.is_empty()).then_some(weights))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let created_at: String = row.get(5)?;
    // Unknown intervals read back as missing; completion then reports the habit as invalid
    let habit_interval = row
        .get::<_, Option<String>>(14)?
        .and_then(|s| HabitInterval::parse(&s).ok());

    Ok(Task {
        id: row.get(0)?,
        parent_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status: TaskStatus::parse_or_default(&row.get::<_, String>(4)?),
        created_at: parse_ts(5, &created_at)?,
        completed_at: parse_opt_ts(6, row.get(6)?)?,
        due_date: parse_opt_ts(7, row.get(7)?)?,
        difficulty: Difficulty::from_stored(row.get(8)?),
        attribute: Attribute::parse_or_default(&row.get::<_, String>(9)?),
        weights: weights_from_sql(10, row.get(10)?)?,
        xp_value: xp_from_sql(row.get(11)?),
        is_project: row.get(12)?,
        is_habit: row.get(13)?,
        habit_interval,
        habit_start_date: parse_opt_ts(15, row.get(15)?)?,
        habit_end_date: parse_opt_ts(16, row.get(16)?)?,
        habit_goal: row
            .get::<_, Option<i64>>(17)?
            .map(|g| g.clamp(0, u32::MAX as i64) as u32),
    })
}

impl Repo<'_> {
    /// Insert a task row, returning its id
    pub fn insert_task(&self, task: &TaskInsert) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO tasks (parent_id, title, status, created_at, difficulty, attribute,
                               attributes, xp_value, is_project, is_habit, habit_interval,
                               habit_start_date, habit_end_date, habit_goal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                task.parent_id,
                task.title,
                task.status.as_str(),
                ts(task.created_at),
                task.difficulty.value() as i64,
                task.attribute.code(),
                weights_to_sql(task.weights.as_ref())?,
                xp_to_sql(task.xp_value),
                task.is_project,
                task.is_habit,
                task.habit_interval.map(|i| i.as_str()),
                task.habit_start_date.map(ts),
                task.habit_end_date.map(ts),
                task.habit_goal.map(|g| g as i64),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = self.conn.query_row(&sql, params![id], task_from_row).optional()?;
        Ok(task)
    }

    /// Like [`Repo::get_task`] but a missing row is `TaskNotFound`
    pub fn require_task(&self, id: i64) -> Result<Task> {
        self.get_task(id)?.ok_or(EngineError::TaskNotFound(id))
    }

    /// Every task, ordered by id
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Direct children of `parent_id`, ordered by id
    pub fn list_children(&self, parent_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE parent_id = ?1 ORDER BY id",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map(params![parent_id], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn count_children(&self, parent_id: i64) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE parent_id = ?1",
            params![parent_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn mark_task_done(&self, id: i64, completed_at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET status = ?2, completed_at = ?3 WHERE id = ?1",
            params![id, TaskStatus::Done.as_str(), ts(completed_at)],
        )?;
        Ok(())
    }

    /// Habit back to pending with its next due date
    pub fn reschedule_habit(
        &self,
        id: i64,
        completed_at: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET status = ?2, completed_at = ?3, due_date = ?4 WHERE id = ?1",
            params![id, TaskStatus::Pending.as_str(), ts(completed_at), ts(due_date)],
        )?;
        Ok(())
    }

    pub fn update_task_status(&self, id: i64, status: TaskStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(())
    }

    /// Pending again, with no completion time
    pub fn reset_task_to_pending(&self, id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET status = ?2, completed_at = NULL WHERE id = ?1",
            params![id, TaskStatus::Pending.as_str()],
        )?;
        Ok(())
    }

    pub fn update_task_difficulty(&self, id: i64, difficulty: Difficulty, xp_value: u64) -> Result<()> {
        self.conn.execute(
            "UPDATE tasks SET difficulty = ?2, xp_value = ?3 WHERE id = ?1",
            params![id, difficulty.value() as i64, xp_to_sql(xp_value)],
        )?;
        Ok(())
    }

    /// Whether any project with exactly this title has been completed
    pub fn has_completed_project_title(&self, title: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE is_project = 1 AND status = ?1 AND title = ?2)",
            params![TaskStatus::Done.as_str(), title],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}
