use rusqlite::{Connection, params};
use std::path::Path;

use breedflow_utils::BreedRow;

use crate::schema::{quote_ident, TableSchema};

/// SQLite database holding one dataset: its tables plus a `_loads` history.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _loads (
                load_id TEXT PRIMARY KEY,
                table_name TEXT NOT NULL,
                status TEXT NOT NULL,
                row_count INTEGER NOT NULL,
                inserted_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_loads_table_name ON _loads(table_name);"
        )?;
        Ok(())
    }

    /// Drop and recreate `schema.name`, insert `rows` and record the load, all
    /// in one transaction. On error nothing changes.
    pub fn replace_table<I>(
        &mut self,
        load_id: &str,
        schema: &TableSchema,
        rows: I,
        inserted_at: &str,
    ) -> Result<usize, rusqlite::Error>
    where
        I: IntoIterator<Item = BreedRow>,
    {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {}; {};",
            quote_ident(&schema.name),
            schema.sqlite_ddl()
        ))?;

        let mut count = 0usize;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (row_id, breed_json, updated_at) VALUES (?1, ?2, ?3)",
                quote_ident(&schema.name)
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.row_id,
                    row.breed_json.to_string(),
                    row.updated_at_rfc3339()
                ])?;
                count += 1;
            }
        }

        tx.execute(
            "INSERT INTO _loads (load_id, table_name, status, row_count, inserted_at)
             VALUES (?1, ?2, 'loaded', ?3, ?4)",
            params![load_id, schema.name, count as i64, inserted_at],
        )?;
        tx.commit()?;
        Ok(count)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, rusqlite::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All rows of a loaded table, ordered by `row_id`.
    pub fn table_rows(&self, table: &str) -> Result<Vec<StoredRow>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT row_id, breed_json, updated_at FROM {} ORDER BY row_id",
            quote_ident(table)
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredRow {
                row_id: row.get(0)?,
                breed_json: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;
        rows.collect()
    }

    /// Get recent loads, newest first.
    pub fn recent_loads(&self, limit: usize) -> Result<Vec<LoadRow>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT load_id, table_name, status, row_count, inserted_at
             FROM _loads ORDER BY inserted_at DESC, rowid DESC LIMIT ?1"
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(LoadRow {
                load_id: row.get(0)?,
                table_name: row.get(1)?,
                status: row.get(2)?,
                row_count: row.get(3)?,
                inserted_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub row_id: i64,
    pub breed_json: String,
    pub updated_at: String,
}

#[derive(Debug)]
pub struct LoadRow {
    pub load_id: String,
    pub table_name: String,
    pub status: String,
    pub row_count: i64,
    pub inserted_at: String,
}
