//! Database schema

use rusqlite::{params, Connection};

pub const SCHEMA_VERSION: u32 = 1;

/// Create tables and indexes if missing. Safe to run on every open.
pub(super) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS player (
            key TEXT PRIMARY KEY,
            level INTEGER NOT NULL DEFAULT 0,
            xp_total INTEGER NOT NULL DEFAULT 0,
            xp_str INTEGER NOT NULL DEFAULT 0,
            xp_int INTEGER NOT NULL DEFAULT 0,
            xp_wis INTEGER NOT NULL DEFAULT 0,
            xp_art INTEGER NOT NULL DEFAULT 0,
            xp_home INTEGER NOT NULL DEFAULT 0,
            xp_out INTEGER NOT NULL DEFAULT 0,
            xp_read INTEGER NOT NULL DEFAULT 0,
            xp_cinema INTEGER NOT NULL DEFAULT 0,
            xp_career INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            parent_id INTEGER REFERENCES tasks(id),
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            completed_at TEXT,
            due_date TEXT,
            difficulty INTEGER NOT NULL DEFAULT 1,
            attribute TEXT NOT NULL DEFAULT 'WIS',
            attributes TEXT,
            xp_value INTEGER NOT NULL DEFAULT 0,
            is_project INTEGER NOT NULL DEFAULT 0,
            is_habit INTEGER NOT NULL DEFAULT 0,
            habit_interval TEXT,
            habit_start_date TEXT,
            habit_end_date TEXT,
            habit_goal INTEGER
        );

        CREATE TABLE IF NOT EXISTS blueprints (
            code TEXT PRIMARY KEY,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS task_completions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id INTEGER NOT NULL REFERENCES tasks(id),
            completed_at TEXT NOT NULL,
            difficulty INTEGER NOT NULL,
            xp_awarded INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schema_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
        CREATE INDEX IF NOT EXISTS idx_completions_task ON task_completions(task_id, completed_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}
