use crate::error::DbError;
use crate::executor::store::DataStore;
use crate::udbc::deserializer::from_row;
use crate::udbc::param::{BoundParam, IntoPlaceholder, ParamType, Params, Placeholder};
use crate::udbc::row::{ResultSet, Row};
use crate::udbc::serializer::{Args, to_args};
use crate::udbc::value::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;

/// Outcome of the last execution, kept after its rows have been fetched.
#[derive(Debug)]
struct Executed {
    columns: Vec<String>,
    row_count: u64,
}

/// A statement compiled on the backend, plus its bindings and the unread
/// rows of its last execution.
pub struct PreparedStatement<'s> {
    store: &'s DataStore,
    sql: String,
    bindings: BTreeMap<Placeholder, BoundParam>,
    executed: Option<Executed>,
    pending: VecDeque<Row>,
    /// Bindings changed since the last execution.
    stale: bool,
}

impl<'s> PreparedStatement<'s> {
    pub(crate) fn new(store: &'s DataStore, sql: &str) -> Self {
        Self {
            store,
            sql: sql.to_string(),
            bindings: BTreeMap::new(),
            executed: None,
            pending: VecDeque::new(),
            stale: false,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binds `value`, inferring its type: integer, then boolean, then null,
    /// and string for anything else.
    pub fn bind(
        &mut self,
        param: impl IntoPlaceholder,
        value: impl Into<Value>,
    ) -> Result<&mut Self, DbError> {
        let value = value.into();
        let ty = ParamType::infer(&value);
        self.bind_typed(param, value, ty)
    }

    /// Binds `value` as `ty`, converting it first.
    pub fn bind_typed(
        &mut self,
        param: impl IntoPlaceholder,
        value: impl Into<Value>,
        ty: ParamType,
    ) -> Result<&mut Self, DbError> {
        let placeholder = param.into_placeholder()?;
        let value = ty.coerce(value.into())?;
        self.bindings.insert(placeholder, BoundParam { value, ty });
        self.stale = true;
        Ok(self)
    }

    /// Binds struct fields or map entries by name, tuple or sequence
    /// elements by position.
    pub fn bind_all<T: Serialize + ?Sized>(&mut self, args: &T) -> Result<&mut Self, DbError> {
        match to_args(args)? {
            Args::None => {}
            Args::Single(v) => {
                self.bind(1usize, v)?;
            }
            Args::Positional(values) => {
                for (i, v) in values.into_iter().enumerate() {
                    self.bind(i + 1, v)?;
                }
            }
            Args::Named(values) => {
                for (name, v) in values {
                    self.bind(name.as_str(), v)?;
                }
            }
        }
        Ok(self)
    }

    pub fn bound(&self, param: impl IntoPlaceholder) -> Option<&BoundParam> {
        let placeholder = param.into_placeholder().ok()?;
        self.bindings.get(&placeholder)
    }

    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
        self.stale = true;
    }

    /// Runs the statement with the current bindings. Any unread rows from a
    /// previous execution are discarded.
    pub async fn execute(&mut self) -> Result<bool, DbError> {
        let params = Params::from_bindings(&self.bindings)?;
        let result = self.store.run(&self.sql, &params).await?;
        let ResultSet {
            columns,
            rows,
            row_count,
        } = result;
        self.executed = Some(Executed { columns, row_count });
        self.pending = rows.into();
        self.stale = false;
        Ok(true)
    }

    async fn ensure_executed(&mut self) -> Result<(), DbError> {
        if self.executed.is_none() || self.stale {
            self.execute().await?;
        }
        Ok(())
    }

    /// Every unread row, in backend order.
    pub async fn fetch_all(&mut self) -> Result<Vec<Row>, DbError> {
        self.ensure_executed().await?;
        Ok(self.pending.drain(..).collect())
    }

    /// The next unread row; right after execution, the first one.
    pub async fn fetch_one(&mut self) -> Result<Option<Row>, DbError> {
        self.ensure_executed().await?;
        Ok(self.pending.pop_front())
    }

    pub async fn fetch_all_as<T: DeserializeOwned>(&mut self) -> Result<Vec<T>, DbError> {
        self.fetch_all()
            .await?
            .iter()
            .map(from_row)
            .collect()
    }

    pub async fn fetch_one_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>, DbError> {
        self.fetch_one()
            .await?
            .map(|row| from_row(&row))
            .transpose()
    }

    /// Rows affected or returned by the last execution.
    pub fn row_count(&self) -> Result<u64, DbError> {
        self.executed
            .as_ref()
            .map(|e| e.row_count)
            .ok_or_else(|| DbError::usage("row count read before the statement was executed"))
    }

    pub fn column_names(&self) -> Result<&[String], DbError> {
        self.executed
            .as_ref()
            .map(|e| e.columns.as_slice())
            .ok_or_else(|| DbError::usage("columns read before the statement was executed"))
    }

    /// Consumes the statement, returning the last execution's unread rows.
    pub fn into_result(self) -> Option<ResultSet> {
        let executed = self.executed?;
        Some(ResultSet {
            columns: executed.columns,
            rows: self.pending.into(),
            row_count: executed.row_count,
        })
    }

    /// Human readable dump of the SQL text and every binding.
    pub fn debug_dump_params(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "SQL: [{}] {}", self.sql.len(), self.sql);
        let _ = writeln!(out, "Params: {}", self.bindings.len());
        for (placeholder, param) in &self.bindings {
            let shown = match &param.value {
                Value::Str(s) => format!("'{}'", s),
                other => other.to_string(),
            };
            let _ = writeln!(out, "Key: {} type={} value={}", placeholder, param.ty, shown);
        }
        out
    }
}
