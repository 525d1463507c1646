use crate::error::{DbError, sqlite_native};
use crate::models::db_config::DbConfig;
use crate::models::db_type::DatabaseType;
use crate::udbc::DEFAULT_DB_NAME;
use crate::udbc::connection::Connection;
use crate::udbc::driver::Driver;
use crate::udbc_sqlite::connection::SqliteConnection;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Opens one SQLite handle per [`Driver::connection`] call. An in-memory
/// path gives every connection its own private database.
pub struct SqliteDriver {
    name: String,
    path: String,
    busy_timeout: Option<Duration>,
}

impl SqliteDriver {
    pub fn new(config: &DbConfig) -> Result<Self, DbError> {
        config.validate()?;
        Ok(Self {
            name: DEFAULT_DB_NAME.to_string(),
            path: config.database.clone(),
            busy_timeout: config.connect_timeout,
        })
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn open(&self) -> Result<rusqlite::Connection, rusqlite::Error> {
        let conn = rusqlite::Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if let Some(timeout) = self.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        Ok(conn)
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn db_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn connection(&self) -> Result<Arc<dyn Connection>, DbError> {
        let conn = self
            .open()
            .map_err(|e| DbError::Connection(sqlite_native(&e)))?;
        info!(driver = %self.name, path = %self.path, "sqlite connection opened");
        Ok(Arc::new(SqliteConnection::new(conn)))
    }

    async fn close(&self) -> Result<(), DbError> {
        Ok(())
    }
}
