//! SQLite storage for keyed settings.
//!
//! Credentials and preferences are stored as plain key/value rows in a single
//! `settings` table. Reading a key that was never written yields `None`.
//!
//! The database is stored in the platform data directory as `spotwrap.db`
//! unless `[database] path` overrides it.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Settings database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get the default database file path
    pub fn db_path() -> anyhow::Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "spotwrap", "Spotwrap")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join("spotwrap.db"))
    }

    /// Open or create the database at the given path
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;

        let db = Self { conn };
        db.init_schema()?;

        tracing::info!("Opened settings database at {:?}", path);
        Ok(db)
    }

    /// Open a throwaway in-memory database
    #[cfg(test)]
    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
    }

    /// Look up a setting by key
    pub fn get_setting(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }

    /// Insert or overwrite a setting
    pub fn set_setting(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Write several settings atomically
    pub fn set_settings(&mut self, entries: &[(&str, &str)]) -> rusqlite::Result<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in entries {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit()
    }
}
