//! SQLite-backed entity store.
//!
//! One row per entity, the full NGSI-LD document as text. Reads hand back
//! the stored JSON untouched; all interpretation happens in the transcoder.

use crate::entity::Entity;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Entity store backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE entities (
///     id TEXT PRIMARY KEY,
///     type TEXT NOT NULL,
///     data TEXT NOT NULL      -- Full NGSI-LD JSON document
/// );
/// ```
///
/// # Thread Safety
/// - Connection is wrapped in Mutex for safe concurrent access
/// - Writers replace whole types inside a transaction; there is no
///   partial-patch path at this level
pub struct EntityStore {
    conn: Mutex<Connection>,
}

/// One raw store row: the document is returned as stored.
#[derive(Clone, Debug)]
pub struct StoredEntity {
    pub id: String,
    pub entity_type: String,
    pub data: String,
}

impl EntityStore {
    /// Creates or opens a store at `db_path`.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open database")?;
        Self::with_connection(conn)
    }

    /// In-memory store for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create entities table")?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(type)",
            [],
        )
        .context("Failed to create type index")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All rows of one entity type, in id order.
    pub fn get_by_type(&self, entity_type: &str) -> Result<Vec<StoredEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, type, data FROM entities WHERE type = ?1 ORDER BY id")
            .context("Failed to prepare query")?;

        let rows = stmt
            .query_map(params![entity_type], |row| {
                Ok(StoredEntity {
                    id: row.get(0)?,
                    entity_type: row.get(1)?,
                    data: row.get(2)?,
                })
            })
            .context("Failed to execute query")?
            .collect::<Result<Vec<StoredEntity>, _>>()
            .context("Failed to read results")?;

        Ok(rows)
    }

    /// Distinct entity types currently stored, sorted.
    pub fn types(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT DISTINCT type FROM entities ORDER BY type")
            .context("Failed to prepare query")?;

        let types = stmt
            .query_map([], |row| row.get(0))
            .context("Failed to execute query")?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to read results")?;

        Ok(types)
    }

    /// Entity counts grouped by type, sorted by type.
    pub fn counts_by_type(&self) -> Result<Vec<(String, usize)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT type, COUNT(*) FROM entities GROUP BY type ORDER BY type")
            .context("Failed to prepare query")?;

        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
            })
            .context("Failed to execute query")?
            .collect::<Result<Vec<(String, usize)>, _>>()
            .context("Failed to read results")?;

        Ok(counts)
    }

    /// Replace every entity of `entity_type` with the given batch
    /// (delete-by-type then insert, in one transaction).
    pub fn replace_all(&self, entity_type: &str, entities: &[Entity]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        tx.execute("DELETE FROM entities WHERE type = ?1", params![entity_type])
            .context("Failed to delete existing entities")?;

        let mut inserted = 0;
        for entity in entities {
            let data = entity.to_store_record()?;
            tx.execute(
                "INSERT OR REPLACE INTO entities (id, type, data) VALUES (?1, ?2, ?3)",
                params![entity.id, entity.entity_type, data],
            )
            .context("Failed to insert entity")?;
            inserted += 1;
        }

        tx.commit().context("Failed to commit transaction")?;
        Ok(inserted)
    }

    /// Insert or replace a batch of entities by id.
    pub fn upsert_all(&self, entities: &[Entity]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("Failed to begin transaction")?;

        let mut upserted = 0;
        for entity in entities {
            let data = entity.to_store_record()?;
            tx.execute(
                "INSERT OR REPLACE INTO entities (id, type, data) VALUES (?1, ?2, ?3)",
                params![entity.id, entity.entity_type, data],
            )
            .context("Failed to upsert entity")?;
            upserted += 1;
        }

        tx.commit().context("Failed to commit transaction")?;
        Ok(upserted)
    }

    /// Delete every stored entity.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute("DELETE FROM entities", [])
            .context("Failed to clear entities")?;
        Ok(())
    }
}
