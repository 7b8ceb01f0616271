//! Player singleton repository

use super::{xp_from_sql, xp_to_sql, Repo};
use crate::error::Result;
use crate::progression::{Attribute, AttributeXp};
use crate::types::{Player, MAIN_PLAYER_KEY};
use rusqlite::{params, OptionalExtension, Row};

const PLAYER_COLUMNS: &str = "key, level, xp_total, xp_str, xp_int, xp_wis, xp_art, xp_home, \
                              xp_out, xp_read, xp_cinema, xp_career";

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    let mut attributes = AttributeXp::default();
    for (offset, attr) in Attribute::ALL.iter().enumerate() {
        attributes.set(*attr, xp_from_sql(row.get(3 + offset)?));
    }
    Ok(Player {
        key: row.get(0)?,
        level: row.get::<_, i64>(1)?.clamp(0, u32::MAX as i64) as u32,
        xp_total: xp_from_sql(row.get(2)?),
        attributes,
    })
}

impl Repo<'_> {
    pub fn get_player(&self, key: &str) -> Result<Option<Player>> {
        let sql = format!("SELECT {} FROM player WHERE key = ?1", PLAYER_COLUMNS);
        let player = self
            .conn
            .query_row(&sql, params![key], player_from_row)
            .optional()?;
        Ok(player)
    }

    /// The main player, inserted with zeroed counters on first access
    pub fn get_or_create_main_player(&self) -> Result<Player> {
        if let Some(player) = self.get_player(MAIN_PLAYER_KEY)? {
            return Ok(player);
        }
        self.conn.execute(
            "INSERT INTO player (key) VALUES (?1)",
            params![MAIN_PLAYER_KEY],
        )?;
        Ok(Player::new(MAIN_PLAYER_KEY))
    }

    /// Write level, total and all attribute counters
    pub fn update_player(&self, player: &Player) -> Result<()> {
        let sets: Vec<String> = Attribute::ALL
            .iter()
            .enumerate()
            .map(|(i, attr)| format!("{} = ?{}", attr.column(), i + 4))
            .collect();
        let sql = format!(
            "UPDATE player SET level = ?2, xp_total = ?3, {} WHERE key = ?1",
            sets.join(", ")
        );

        let a = &player.attributes;
        self.conn.execute(
            &sql,
            params![
                player.key,
                player.level as i64,
                xp_to_sql(player.xp_total),
                xp_to_sql(a.get(Attribute::Str)),
                xp_to_sql(a.get(Attribute::Int)),
                xp_to_sql(a.get(Attribute::Wis)),
                xp_to_sql(a.get(Attribute::Art)),
                xp_to_sql(a.get(Attribute::Home)),
                xp_to_sql(a.get(Attribute::Out)),
                xp_to_sql(a.get(Attribute::Read)),
                xp_to_sql(a.get(Attribute::Cinema)),
                xp_to_sql(a.get(Attribute::Career)),
            ],
        )?;
        Ok(())
    }
}
