use async_trait::async_trait;
use rusqlite::Statement;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{DbError, NativeError, sqlite_native};
use crate::udbc::connection::Connection;
use crate::udbc::param::Params;
use crate::udbc::row::{ResultSet, Row};
use crate::udbc_sqlite::value_codec::{from_sqlite_value, to_sqlite_value};

/// rusqlite calls are synchronous (a locked database waits out the busy
/// timeout), so every call runs on tokio's blocking pool.
pub struct SqliteConnection {
    conn: Arc<Mutex<Option<rusqlite::Connection>>>,
}

fn exec_err(e: rusqlite::Error) -> DbError {
    DbError::Execution(sqlite_native(&e))
}

impl SqliteConnection {
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    fn lock(
        slot: &Mutex<Option<rusqlite::Connection>>,
    ) -> Result<MutexGuard<'_, Option<rusqlite::Connection>>, DbError> {
        slot.lock().map_err(|_| {
            DbError::Connection(NativeError::client("connection lock poisoned"))
        })
    }

    /// Runs `f` against the handle slot on the blocking pool.
    async fn with_slot<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Option<rusqlite::Connection>) -> Result<T, DbError> + Send + 'static,
    {
        let slot = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = Self::lock(&slot)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| DbError::Connection(NativeError::client(format!("sqlite task failed: {}", e))))?
    }

    /// Runs `f` against the open handle.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, DbError> + Send + 'static,
    {
        self.with_slot(move |slot| {
            let conn = slot
                .as_ref()
                .ok_or_else(|| DbError::Connection(NativeError::client("connection is closed")))?;
            f(conn)
        })
        .await
    }

    fn bind(stmt: &mut Statement<'_>, params: &Params) -> Result<(), DbError> {
        let expected = stmt.parameter_count();
        match params {
            Params::Empty if expected > 0 => Err(DbError::usage(format!(
                "statement expects {} parameter(s) but none were bound",
                expected
            ))),
            Params::Empty => Ok(()),
            Params::Positional(values) => {
                if values.len() != expected {
                    return Err(DbError::usage(format!(
                        "statement expects {} parameter(s), {} bound",
                        expected,
                        values.len()
                    )));
                }
                for (i, v) in values.iter().enumerate() {
                    stmt.raw_bind_parameter(i + 1, to_sqlite_value(v))
                        .map_err(exec_err)?;
                }
                Ok(())
            }
            Params::Named(values) => {
                let mut markers = Vec::with_capacity(expected);
                for i in 1..=expected {
                    let Some(marker) = stmt.parameter_name(i) else {
                        return Err(DbError::usage(
                            "named and positional parameters cannot be mixed",
                        ));
                    };
                    // `:name`, `@name` and `$name` all bind by bare name
                    let key = marker.trim_start_matches([':', '@', '$']).to_string();
                    let Some((_, value)) = values.iter().find(|(name, _)| *name == key) else {
                        return Err(DbError::usage(format!("parameter {} was not bound", marker)));
                    };
                    markers.push((i, key, to_sqlite_value(value)));
                }
                if let Some((name, _)) = values
                    .iter()
                    .find(|(name, _)| !markers.iter().any(|(_, key, _)| key == name))
                {
                    return Err(DbError::usage(format!("statement has no parameter :{}", name)));
                }
                for (index, _, value) in markers {
                    stmt.raw_bind_parameter(index, value).map_err(exec_err)?;
                }
                Ok(())
            }
        }
    }

    fn run(conn: &rusqlite::Connection, sql: &str, params: &Params) -> Result<ResultSet, DbError> {
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| DbError::Prepare(sqlite_native(&e)))?;
        Self::bind(&mut stmt, params)?;

        if stmt.column_count() == 0 {
            let changed = stmt.raw_execute().map_err(exec_err)?;
            return Ok(ResultSet::affected(changed as u64));
        }

        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let shared: Arc<[String]> = names.clone().into();
        let width = names.len();
        let mut out = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next().map_err(exec_err)? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(from_sqlite_value(row.get_ref(i).map_err(exec_err)?));
            }
            out.push(Row::new(shared.clone(), values));
        }
        Ok(ResultSet::with_rows(names, out))
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn prepare(&self, sql: &str) -> Result<(), DbError> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            conn.prepare_cached(&sql)
                .map(|_| ())
                .map_err(|e| DbError::Prepare(sqlite_native(&e)))
        })
        .await
    }

    async fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, DbError> {
        let sql = sql.to_string();
        let params = params.clone();
        self.with_conn(move |conn| Self::run(conn, &sql, &params))
            .await
    }

    async fn last_insert_id(&self) -> Result<Option<String>, DbError> {
        self.with_conn(|conn| {
            let id = conn.last_insert_rowid();
            Ok((id != 0).then(|| id.to_string()))
        })
        .await
    }

    async fn begin(&self) -> Result<(), DbError> {
        self.with_conn(|conn| conn.execute_batch("BEGIN").map_err(exec_err))
            .await
    }

    async fn commit(&self) -> Result<(), DbError> {
        self.with_conn(|conn| conn.execute_batch("COMMIT").map_err(exec_err))
            .await
    }

    async fn rollback(&self) -> Result<(), DbError> {
        self.with_conn(|conn| conn.execute_batch("ROLLBACK").map_err(exec_err))
            .await
    }

    async fn close(&self) -> Result<(), DbError> {
        self.with_slot(|slot| {
            let Some(conn) = slot.take() else {
                return Ok(());
            };
            conn.close()
                .map_err(|(_, e)| DbError::Connection(sqlite_native(&e)))
        })
        .await
    }
}
