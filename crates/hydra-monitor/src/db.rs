//! Persistence for the monitor pipeline's own entities:
//! registered channels, VIP users, the blacklist, the pre-report message
//! cache, and the forwarded-message audit log. One `Connection` guarded by
//! a `Mutex`, matching the per-subsystem handle shape of
//! `hydra-memory::manager`/`hydra-sessions::manager`.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hydra_core::types::{CachedMessage, Channel, ChannelCategory, ChannelId, VipUser};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::error::Result;

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS monitor_channels (
            channel_id TEXT PRIMARY KEY,
            name       TEXT NOT NULL,
            enabled    INTEGER NOT NULL DEFAULT 1,
            category   TEXT NOT NULL DEFAULT 'market'
        );
        CREATE TABLE IF NOT EXISTS monitor_vip_users (
            user_id  TEXT PRIMARY KEY,
            username TEXT,
            name     TEXT NOT NULL,
            enabled  INTEGER NOT NULL DEFAULT 1
        );
        CREATE TABLE IF NOT EXISTS monitor_blacklist (
            channel_id TEXT PRIMARY KEY,
            name       TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS monitor_message_cache (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            channel_id TEXT NOT NULL,
            channel_name TEXT NOT NULL,
            sender     TEXT NOT NULL,
            text       TEXT NOT NULL,
            ts         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cache_channel
            ON monitor_message_cache(channel_id, ts);
        CREATE TABLE IF NOT EXISTS monitor_history (
            user_id    TEXT NOT NULL,
            channel_id TEXT NOT NULL,
            outcome    TEXT NOT NULL,
            ts         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_history_user
            ON monitor_history(user_id, ts);",
    )?;
    Ok(())
}

/// Shared handle used by the ingestion loop and the report scheduler.
pub struct MonitorDb {
    conn: Mutex<Connection>,
}

impl MonitorDb {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn get_channel(&self, channel_id: &str) -> Result<Option<Channel>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT channel_id, name, enabled, category FROM monitor_channels WHERE channel_id = ?1",
                [channel_id],
                |row| {
                    let id: String = row.get(0)?;
                    let name: String = row.get(1)?;
                    let enabled: bool = row.get(2)?;
                    let category: String = row.get(3)?;
                    Ok((id, name, enabled, category))
                },
            )
            .optional()?;

        Ok(row.map(|(id, name, enabled, category)| Channel {
            id: ChannelId::from(id),
            name,
            enabled,
            category: ChannelCategory::from_str(&category).unwrap_or_default(),
        }))
    }

    /// Register a channel if absent (created by operator command or env
    /// config). Never overwrites an existing
    /// row's category — that is only mutated explicitly via
    /// `set_channel_category`.
    pub fn ensure_channel(&self, channel_id: &str, name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO monitor_channels (channel_id, name, enabled, category)
             VALUES (?1, ?2, 1, 'market')
             ON CONFLICT(channel_id) DO UPDATE SET name = excluded.name",
            params![channel_id, name],
        )?;
        Ok(())
    }

    pub fn set_channel_category(&self, channel_id: &str, category: ChannelCategory) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE monitor_channels SET category = ?2 WHERE channel_id = ?1",
            params![channel_id, category.to_string()],
        )?;
        debug!(channel_id, %category, "channel category updated");
        Ok(())
    }

    pub fn get_vip(&self, user_id: &str) -> Result<Option<VipUser>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT user_id, username, name, enabled FROM monitor_vip_users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(VipUser {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        name: row.get(2)?,
                        enabled: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn blacklist(&self) -> Result<HashSet<ChannelId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT channel_id FROM monitor_blacklist")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .map(ChannelId::from)
            .collect();
        Ok(ids)
    }

    pub fn insert_cached_message(&self, msg: &CachedMessage) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO monitor_message_cache (channel_id, channel_name, sender, text, ts)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                msg.channel_id.as_str(),
                msg.channel_name,
                msg.sender,
                msg.text,
                msg.ts.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Distinct channel ids that currently have at least one cached row,
    /// in insertion order — the scheduler's per-wake worklist.
    pub fn channels_with_cache(&self) -> Result<Vec<ChannelId>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT channel_id FROM monitor_message_cache GROUP BY channel_id ORDER BY MIN(id)",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .map(ChannelId::from)
            .collect();
        Ok(ids)
    }

    pub fn cached_messages(&self, channel_id: &str) -> Result<Vec<CachedMessage>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT channel_id, channel_name, sender, text, ts
             FROM monitor_message_cache WHERE channel_id = ?1 ORDER BY ts",
        )?;
        let rows = stmt
            .query_map([channel_id], |row| {
                let id: String = row.get(0)?;
                let name: String = row.get(1)?;
                let sender: String = row.get(2)?;
                let text: String = row.get(3)?;
                let ts: String = row.get(4)?;
                Ok((id, name, sender, text, ts))
            })?
            .filter_map(|r| r.ok())
            .filter_map(|(id, name, sender, text, ts)| {
                let ts: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts).ok()?.with_timezone(&Utc);
                Some(CachedMessage { channel_id: ChannelId::from(id), channel_name: name, sender, text, ts })
            })
            .collect();
        Ok(rows)
    }

    /// Up to `n` cached texts for the channel's category sampling step
    ///.
    pub fn sample_texts(&self, channel_id: &str, n: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT text FROM monitor_message_cache WHERE channel_id = ?1 ORDER BY ts LIMIT ?2")?;
        let rows = stmt
            .query_map(params![channel_id, n as i64], |row| row.get::<_, String>(0))?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }

    pub fn clear_cache(&self, channel_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM monitor_message_cache WHERE channel_id = ?1", [channel_id])?;
        Ok(())
    }

    pub fn record_history(&self, user_id: &str, channel_id: &str, outcome: &str, ts: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO monitor_history (user_id, channel_id, outcome, ts) VALUES (?1, ?2, ?3, ?4)",
            params![user_id, channel_id, outcome, ts.to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> MonitorDb {
        MonitorDb::new(Connection::open_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn unregistered_channel_is_none() {
        let db = db();
        assert!(db.get_channel("100").unwrap().is_none());
    }

    #[test]
    fn ensure_channel_then_category_update_round_trips() {
        let db = db();
        db.ensure_channel("100", "Market News").unwrap();
        let ch = db.get_channel("100").unwrap().unwrap();
        assert_eq!(ch.category, ChannelCategory::Market);

        db.set_channel_category("100", ChannelCategory::Tech).unwrap();
        let ch = db.get_channel("100").unwrap().unwrap();
        assert_eq!(ch.category, ChannelCategory::Tech);
    }

    #[test]
    fn cache_insert_list_and_clear() {
        let db = db();
        let msg = CachedMessage {
            channel_id: ChannelId::from("100"),
            channel_name: "Market".into(),
            sender: "trader".into(),
            text: "BTC breaks 100k resistance on spot volume surge".into(),
            ts: Utc::now(),
        };
        db.insert_cached_message(&msg).unwrap();
        assert_eq!(db.channels_with_cache().unwrap(), vec![ChannelId::from("100")]);
        assert_eq!(db.cached_messages("100").unwrap().len(), 1);

        db.clear_cache("100").unwrap();
        assert!(db.cached_messages("100").unwrap().is_empty());
        assert!(db.channels_with_cache().unwrap().is_empty());
    }
}
