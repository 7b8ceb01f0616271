//! Blueprint status repository

use super::Repo;
use crate::error::Result;
use crate::types::{BlueprintRow, BlueprintStatus};
use rusqlite::{params, OptionalExtension, Row};

fn blueprint_from_row(row: &Row<'_>) -> rusqlite::Result<BlueprintRow> {
    Ok(BlueprintRow {
        code: row.get(0)?,
        status: BlueprintStatus::parse_or_default(&row.get::<_, String>(1)?),
    })
}

impl Repo<'_> {
    pub fn get_blueprint(&self, code: &str) -> Result<Option<BlueprintRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT code, status FROM blueprints WHERE code = ?1",
                params![code],
                blueprint_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn upsert_blueprint(&self, code: &str, status: BlueprintStatus) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO blueprints (code, status) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET status = excluded.status
            "#,
            params![code, status.as_str()],
        )?;
        Ok(())
    }

    pub fn list_blueprint_rows(&self) -> Result<Vec<BlueprintRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT code, status FROM blueprints ORDER BY code")?;
        let rows = stmt
            .query_map([], blueprint_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
