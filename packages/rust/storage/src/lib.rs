//! Definition store adapters.
//!
//! - [`Storage`] wraps a local libSQL database holding serialized
//!   definitions keyed by store coordinates.
//! - [`MemoryStore`] keeps the same contract in process memory.
//!
//! Both implement [`DefinitionStore`]: a missing entry is reported as
//! [`CompdefError::NotFound`], any other failure as [`CompdefError::Storage`].

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use compdef_shared::{CompdefError, Definition, DefinitionStore, Result, StoreCoordinates};
use libsql::{Connection, Database, params};

pub use memory::MemoryStore;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CompdefError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        CompdefError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0,
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CompdefError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Definition rows
    // -----------------------------------------------------------------------

    /// Raw serialized definition for `coordinates`, if stored.
    pub async fn get_raw(&self, coordinates: &StoreCoordinates) -> Result<Option<Vec<u8>>> {
        let mut rows = self
            .conn
            .query(
                "SELECT body FROM definitions WHERE store_key = ?1",
                params![coordinates.store_key()],
            )
            .await
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<Vec<u8>>(0)
                    .map_err(|e| CompdefError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(CompdefError::Storage(e.to_string())),
        }
    }

    /// Upsert a serialized definition.
    pub async fn put_raw(&self, coordinates: &StoreCoordinates, body: Vec<u8>) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO definitions (store_key, coordinates, tool, tool_version, body, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(store_key) DO UPDATE SET
                   body = excluded.body,
                   stored_at = excluded.stored_at",
                params![
                    coordinates.store_key(),
                    coordinates.coordinates.to_string(),
                    coordinates.tool.as_str(),
                    coordinates.tool_version.as_str(),
                    body,
                    now.as_str(),
                ],
            )
            .await
            .map_err(|e| CompdefError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Number of stored definitions.
    pub async fn count_definitions(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM definitions", params![])
            .await
            .map_err(|e| CompdefError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let n = row
                    .get::<i64>(0)
                    .map_err(|e| CompdefError::Storage(e.to_string()))?;
                u64::try_from(n)
                    .map_err(|_| CompdefError::Storage(format!("negative definition count {n}")))
            }
            Ok(None) => Ok(0),
            Err(e) => Err(CompdefError::Storage(e.to_string())),
        }
    }
}

#[async_trait]
impl DefinitionStore for Storage {
    async fn get(&self, coordinates: &StoreCoordinates) -> Result<Definition> {
        let body = self
            .get_raw(coordinates)
            .await?
            .ok_or_else(|| CompdefError::not_found(coordinates.store_key()))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn store(&self, coordinates: &StoreCoordinates, body: Vec<u8>) -> Result<()> {
        self.put_raw(coordinates, body).await
    }
}
