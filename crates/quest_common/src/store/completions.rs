//! Completion ledger repository (append-only, except undo)

use super::{parse_ts, ts, xp_from_sql, xp_to_sql, Repo};
use crate::error::Result;
use crate::types::{Difficulty, TaskCompletion};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<TaskCompletion> {
    let completed_at: String = row.get(2)?;
    Ok(TaskCompletion {
        id: row.get(0)?,
        task_id: row.get(1)?,
        completed_at: parse_ts(2, &completed_at)?,
        difficulty: Difficulty::from_stored(row.get(3)?),
        xp_awarded: xp_from_sql(row.get(4)?),
    })
}

impl Repo<'_> {
    pub fn insert_completion(
        &self,
        task_id: i64,
        completed_at: DateTime<Utc>,
        difficulty: Difficulty,
        xp_awarded: u64,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO task_completions (task_id, completed_at, difficulty, xp_awarded)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                task_id,
                ts(completed_at),
                difficulty.value() as i64,
                xp_to_sql(xp_awarded)
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Completions of `task_id` at `difficulty` on or after `since`
    pub fn count_completions_since(
        &self,
        task_id: i64,
        difficulty: Difficulty,
        since: DateTime<Utc>,
    ) -> Result<u32> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM task_completions
            WHERE task_id = ?1 AND difficulty = ?2 AND completed_at >= ?3
            "#,
            params![task_id, difficulty.value() as i64, ts(since)],
            |row| row.get(0),
        )?;
        Ok(count as u32)
    }

    /// Most recent completion: latest `completed_at`, ties broken by id
    pub fn last_completion(&self, task_id: i64) -> Result<Option<TaskCompletion>> {
        let completion = self
            .conn
            .query_row(
                r#"
                SELECT id, task_id, completed_at, difficulty, xp_awarded
                FROM task_completions WHERE task_id = ?1
                ORDER BY completed_at DESC, id DESC LIMIT 1
                "#,
                params![task_id],
                completion_from_row,
            )
            .optional()?;
        Ok(completion)
    }

    /// Ledger rows for one task, oldest first
    pub fn list_completions(&self, task_id: i64) -> Result<Vec<TaskCompletion>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, task_id, completed_at, difficulty, xp_awarded
            FROM task_completions WHERE task_id = ?1
            ORDER BY completed_at, id
            "#,
        )?;
        let rows = stmt
            .query_map(params![task_id], completion_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_completion(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM task_completions WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Total ledger XP per UTC calendar day in `[since, until)`
    pub fn xp_by_day(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<(NaiveDate, u64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT substr(completed_at, 1, 10) AS day, SUM(xp_awarded)
            FROM task_completions
            WHERE completed_at >= ?1 AND completed_at < ?2
            GROUP BY day ORDER BY day
            "#,
        )?;
        let rows = stmt
            .query_map(params![ts(since), ts(until)], |row| {
                let day: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                Ok((date, xp_from_sql(row.get(1)?)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
