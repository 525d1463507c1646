use crate::error::{DbError, NativeError, mysql_native};
use crate::models::db_config::DbConfig;
use crate::models::db_type::DatabaseType;
use crate::udbc::DEFAULT_DB_NAME;
use crate::udbc::connection::Connection;
use crate::udbc::driver::Driver;
use crate::udbc_mysql::connection::MysqlConnection;
use async_trait::async_trait;
use mysql_async::Pool as MySqlPoolInternal;
use mysql_async::{OptsBuilder, PoolConstraints, PoolOpts};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct MysqlDriver {
    name: String,
    persistent: bool,
    connect_timeout: Option<Duration>,
    pool: MySqlPoolInternal,
}

impl MysqlDriver {
    /// Builds the pool. No connection is opened until the first
    /// [`Driver::connection`] call.
    pub fn new(config: &DbConfig) -> Result<Self, DbError> {
        config.validate()?;
        let constraints = PoolConstraints::new(
            config.max_idle_conns as usize,
            config.max_open_conns.max(1) as usize,
        )
        .ok_or_else(|| DbError::Config("Invalid pool constraints: min > max".to_string()))?;

        let builder = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .db_name(Some(config.database.clone()))
            .user(Some(config.username.clone()))
            .pass(Some(config.password.clone()))
            .init(vec![format!("SET NAMES {}", config.charset)])
            .pool_opts(PoolOpts::default().with_constraints(constraints));

        Ok(Self {
            name: DEFAULT_DB_NAME.to_string(),
            persistent: config.persistent,
            connect_timeout: config.connect_timeout,
            pool: MySqlPoolInternal::new(builder),
        })
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn db_type(&self) -> DatabaseType {
        DatabaseType::MySql
    }

    async fn connection(&self) -> Result<Arc<dyn Connection>, DbError> {
        let pending = self.pool.get_conn();
        let conn = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                DbError::Connection(NativeError::client(format!(
                    "timed out after {:?} waiting for a connection",
                    limit
                )))
            })?,
            None => pending.await,
        }
        .map_err(|e| DbError::Connection(mysql_native(&e)))?;
        info!(driver = %self.name, "mysql connection acquired");
        Ok(Arc::new(MysqlConnection::new(conn, self.persistent)))
    }

    async fn close(&self) -> Result<(), DbError> {
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| DbError::Connection(mysql_native(&e)))
    }
}
