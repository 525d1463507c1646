use crate::driver_manager::build_driver;
use crate::error::DbError;
use crate::executor::attempt::Attempt;
use crate::executor::statement::PreparedStatement;
use crate::models::db_config::DbConfig;
use crate::models::db_type::DatabaseType;
use crate::transaction::Transaction;
use crate::udbc::connection::Connection;
use crate::udbc::driver::Driver;
use crate::udbc::param::Params;
use crate::udbc::row::ResultSet;
use crate::udbc::value::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Prepared-statement access to one database connection.
///
/// Calls are serialized on the connection, but a store shared between tasks
/// shares its session and its transaction too; give each task its own store
/// or synchronize around multi-statement work.
pub struct DataStore {
    conn: Arc<dyn Connection>,
    driver: Arc<dyn Driver>,
    /// Shut the driver down on close; set when the store built it.
    owns_driver: bool,
    in_transaction: AtomicBool,
    /// Set when a [`Transaction`] guard is dropped unfinished.
    pub(crate) rollback_pending: AtomicBool,
}

impl DataStore {
    /// Builds a driver for `config` and takes one connection from it.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let driver = build_driver(config)?;
        match Self::open(driver.clone()).await {
            Ok(mut store) => {
                store.owns_driver = true;
                Ok(store)
            }
            Err(e) => {
                if let Err(close_err) = driver.close().await {
                    debug!(error = %close_err, "closing driver after failed connect");
                }
                Err(e)
            }
        }
    }

    /// Takes one connection from a driver the caller keeps alive, so pooled
    /// connections outlive the store.
    pub async fn open(driver: Arc<dyn Driver>) -> Result<Self, DbError> {
        let conn = driver.connection().await?;
        Ok(Self {
            conn,
            driver,
            owns_driver: false,
            in_transaction: AtomicBool::new(false),
            rollback_pending: AtomicBool::new(false),
        })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.driver.db_type()
    }

    /// Compiles `sql` on the backend without running it.
    pub async fn prepare(&self, sql: &str) -> Result<PreparedStatement<'_>, DbError> {
        if sql.trim().is_empty() {
            return Err(DbError::usage("cannot prepare an empty statement"));
        }
        self.settle_abandoned().await?;
        self.conn.prepare(sql).await?;
        Ok(PreparedStatement::new(self, sql))
    }

    pub(crate) async fn run(&self, sql: &str, params: &Params) -> Result<ResultSet, DbError> {
        self.settle_abandoned().await?;
        let start = Instant::now();
        let result = self.conn.execute(sql, params).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(rs) => debug!(sql, ?params, elapsed_ms, rows = rs.row_count, "execute"),
            Err(e) => debug!(sql, ?params, elapsed_ms, error = %e, "execute failed"),
        }
        result
    }

    /// Id generated by the most recent insert on this connection.
    pub async fn last_insert_id(&self) -> Result<Option<String>, DbError> {
        self.conn.last_insert_id().await
    }

    /// Best-effort execution: binds `params` by position and runs `sql`.
    /// Failures of any kind are logged and returned as [`Attempt::Failed`].
    pub async fn run_unparameterized(&self, sql: &str, params: &[Value]) -> Attempt {
        match self.run_positional(sql, params).await {
            Ok(rs) => Attempt::Completed(rs),
            Err(e) => {
                warn!(sql, error = %e, "best-effort statement failed");
                Attempt::Failed(e)
            }
        }
    }

    async fn run_positional(&self, sql: &str, params: &[Value]) -> Result<ResultSet, DbError> {
        let mut stmt = self.prepare(sql).await?;
        for (i, v) in params.iter().enumerate() {
            stmt.bind(i + 1, v.clone())?;
        }
        stmt.execute().await?;
        Ok(stmt.into_result().unwrap_or_default())
    }

    /// Runs each statement through [`DataStore::run_unparameterized`],
    /// continuing past failures.
    pub async fn run_best_effort_batch(&self, statements: &[&str]) -> Vec<Attempt> {
        let mut out = Vec::with_capacity(statements.len());
        for sql in statements {
            out.push(self.run_unparameterized(sql, &[]).await);
        }
        let failed = out.iter().filter(|a| a.is_failed()).count();
        info!(total = out.len(), failed, "best-effort batch finished");
        out
    }

    /// False once a guard has been dropped unfinished, even before the
    /// backend rollback has been sent.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::Acquire)
            && !self.rollback_pending.load(Ordering::Acquire)
    }

    /// Rolls back a transaction whose guard was dropped unfinished.
    async fn settle_abandoned(&self) -> Result<(), DbError> {
        if !self.rollback_pending.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let result = self.conn.rollback().await;
        self.in_transaction.store(false, Ordering::Release);
        match &result {
            Ok(()) => debug!("abandoned transaction rolled back"),
            Err(e) => warn!(error = %e, "rollback of abandoned transaction failed"),
        }
        result
    }

    /// Starts a transaction. Fails if one is already open on this connection.
    pub async fn begin_transaction(&self) -> Result<(), DbError> {
        self.settle_abandoned().await?;
        if self.in_transaction.swap(true, Ordering::AcqRel) {
            return Err(DbError::usage(
                "a transaction is already active on this connection",
            ));
        }
        if let Err(e) = self.conn.begin().await {
            self.in_transaction.store(false, Ordering::Release);
            return Err(e);
        }
        Ok(())
    }

    /// Commits the open transaction. On failure it stays open.
    pub async fn commit(&self) -> Result<(), DbError> {
        self.settle_abandoned().await?;
        if !self.in_transaction() {
            return Err(DbError::usage("there is no active transaction"));
        }
        self.conn.commit().await?;
        self.in_transaction.store(false, Ordering::Release);
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DbError> {
        self.settle_abandoned().await?;
        if !self.in_transaction() {
            return Err(DbError::usage("there is no active transaction"));
        }
        let result = self.conn.rollback().await;
        self.in_transaction.store(false, Ordering::Release);
        result
    }

    /// Starts a transaction and returns a guard that rolls it back if it is
    /// dropped before `commit` or `rollback`.
    pub async fn transaction(&self) -> Result<Transaction<'_>, DbError> {
        Transaction::begin(self).await
    }

    /// Releases the connection, rolling back a transaction left open.
    pub async fn close(self) -> Result<(), DbError> {
        if let Err(e) = self.settle_abandoned().await {
            warn!(error = %e, "closing store after a failed rollback");
        }
        if self.in_transaction() {
            warn!("closing store with an open transaction; rolling back");
            if let Err(e) = self.rollback().await {
                warn!(error = %e, "rollback on close failed");
            }
        }
        self.conn.close().await?;
        if self.owns_driver {
            self.driver.close().await?;
        }
        info!(db_type = self.db_type().as_str(), "data store closed");
        Ok(())
    }
}
