use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Params as MyParams, Row as MyRow};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, NativeError, mysql_native};
use crate::udbc::connection::Connection;
use crate::udbc::param::Params;
use crate::udbc::row::{ResultSet, Row};
use crate::udbc::value::Value;
use crate::udbc_mysql::value_codec::{from_mysql_value, to_mysql_value};

pub struct MysqlConnection {
    conn: Mutex<Option<Conn>>,
    /// Return the connection to the pool on close instead of disconnecting.
    persistent: bool,
}

impl MysqlConnection {
    pub fn new(conn: Conn, persistent: bool) -> Self {
        Self {
            conn: Mutex::new(Some(conn)),
            persistent,
        }
    }

    fn closed() -> DbError {
        DbError::Connection(NativeError::client("connection is closed"))
    }

    fn to_params(params: &Params) -> MyParams {
        match params {
            Params::Empty => MyParams::Empty,
            Params::Positional(values) => {
                MyParams::Positional(values.iter().map(to_mysql_value).collect())
            }
            Params::Named(values) => MyParams::Named(
                values
                    .iter()
                    .map(|(name, v)| (name.as_bytes().to_vec(), to_mysql_value(v)))
                    .collect::<HashMap<_, _>>(),
            ),
        }
    }

    fn map_rows(names: Vec<String>, rows: Vec<MyRow>) -> Vec<Row> {
        let shared: Arc<[String]> = names.into();
        rows.into_iter()
            .map(|row| {
                let cols = row.columns_ref();
                let values = (0..row.len())
                    .map(|i| {
                        row.as_ref(i)
                            .map(|v| from_mysql_value(v, cols.get(i)))
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Row::new(shared.clone(), values)
            })
            .collect()
    }

    async fn run_control(&self, sql: &str) -> Result<(), DbError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(Self::closed)?;
        conn.query_drop(sql)
            .await
            .map_err(|e| DbError::Execution(mysql_native(&e)))
    }
}

#[async_trait]
impl Connection for MysqlConnection {
    async fn prepare(&self, sql: &str) -> Result<(), DbError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(Self::closed)?;
        // The statement lands in the connection's statement cache and is
        // reused by `execute` for the same text.
        conn.prep(sql)
            .await
            .map(|_| ())
            .map_err(|e| DbError::Prepare(mysql_native(&e)))
    }

    async fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, DbError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or_else(Self::closed)?;
        let result = conn
            .exec_iter(sql, Self::to_params(params))
            .await
            .map_err(|e| DbError::Execution(mysql_native(&e)))?;
        // Empty for statements that never return rows, even when a query
        // matched nothing.
        let names: Vec<String> = result
            .columns_ref()
            .iter()
            .map(|c| c.name_str().to_string())
            .collect();
        let rows: Vec<MyRow> = result
            .collect_and_drop()
            .await
            .map_err(|e| DbError::Execution(mysql_native(&e)))?;
        if names.is_empty() {
            return Ok(ResultSet::affected(conn.affected_rows()));
        }
        let rows = Self::map_rows(names.clone(), rows);
        Ok(ResultSet::with_rows(names, rows))
    }

    async fn last_insert_id(&self) -> Result<Option<String>, DbError> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(Self::closed)?;
        Ok(conn
            .last_insert_id()
            .filter(|id| *id != 0)
            .map(|id| id.to_string()))
    }

    async fn begin(&self) -> Result<(), DbError> {
        self.run_control("START TRANSACTION").await
    }

    async fn commit(&self) -> Result<(), DbError> {
        self.run_control("COMMIT").await
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.run_control("ROLLBACK").await
    }

    async fn close(&self) -> Result<(), DbError> {
        let Some(conn) = self.conn.lock().await.take() else {
            return Ok(());
        };
        if self.persistent {
            debug!("returning mysql connection to pool");
            drop(conn);
            Ok(())
        } else {
            conn.disconnect()
                .await
                .map_err(|e| DbError::Connection(mysql_native(&e)))
        }
    }
}
