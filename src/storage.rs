use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ticket::{ScanResult, Ticket, TicketLeg};

pub const TICKET_KEY: &str = "jtt_ticket_pairs";
pub const SCAN_KEY: &str = "jack_ticket_scan_result";
pub const PREFERRED_HOME_KEY: &str = "jtt_preferred_home";
pub const TOKEN_KEY: &str = "jtt_token";
pub const USER_KEY: &str = "jtt_user";

/// String key-value store with JSON values, the client's persistent scratchpad.
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .with_context(|| format!("read key {key}"))
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("write key {key}"))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])
            .with_context(|| format!("remove key {key}"))?;
        Ok(())
    }

    /// Missing, unreadable and corrupt values all read as `None`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).with_context(|| format!("serialize {key}"))?;
        self.set_raw(key, &json)
    }

    pub fn load_ticket(&self) -> Ticket {
        Ticket {
            legs: self.get_json::<Vec<TicketLeg>>(TICKET_KEY).unwrap_or_default(),
        }
    }

    pub fn save_ticket(&self, ticket: &Ticket) -> Result<()> {
        self.set_json(TICKET_KEY, &ticket.legs)
    }

    pub fn load_scan(&self) -> Option<ScanResult> {
        self.get_json::<ScanResult>(SCAN_KEY)
            .filter(|scan| !scan.scanned_pairs.is_empty())
    }

    pub fn save_scan(&self, scan: &ScanResult) -> Result<()> {
        self.set_json(SCAN_KEY, scan)
    }

    pub fn clear_scan(&self) -> Result<()> {
        self.remove(SCAN_KEY)
    }

    pub fn preferred_home(&self) -> PreferredHome {
        match self.get_raw(PREFERRED_HOME_KEY).ok().flatten().as_deref() {
            Some("/loto") => PreferredHome::Lotto,
            _ => PreferredHome::Tips,
        }
    }

    pub fn set_preferred_home(&self, home: PreferredHome) -> Result<()> {
        self.set_raw(PREFERRED_HOME_KEY, home.path())
    }
}

/// Which landing page (and theme) the user prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredHome {
    Tips,
    Lotto,
}

impl PreferredHome {
    pub fn path(self) -> &'static str {
        match self {
            PreferredHome::Tips => "/",
            PreferredHome::Lotto => "/loto",
        }
    }

    pub fn is_lotto_theme(self) -> bool {
        self == PreferredHome::Lotto
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .context("init kv schema")?;
    Ok(())
}
