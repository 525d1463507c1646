use std::fmt;
use thiserror::Error;

/// Error reported by the database backend, kept as the backend produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Driver specific error number (MySQL error code, SQLite extended result code).
    pub code: Option<i32>,
    /// Five character SQLSTATE, when the backend reports one.
    pub sqlstate: Option<String>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: Option<i32>, sqlstate: Option<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            sqlstate,
            message: message.into(),
        }
    }

    /// An error raised by the client library rather than the server.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(None, None, message)
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.sqlstate) {
            (Some(code), Some(state)) => write!(f, "[{code}] ({state}) {}", self.message),
            (Some(code), None) => write!(f, "[{code}] {}", self.message),
            (None, Some(state)) => write!(f, "({state}) {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Errors produced by the data store and its drivers.
#[derive(Error, Debug)]
pub enum DbError {
    /// The connection could not be established or was lost outside a statement.
    #[error("Connection error: {0}")]
    Connection(NativeError),
    /// The backend rejected the SQL text before execution.
    #[error("Prepare error: {0}")]
    Prepare(NativeError),
    /// The statement failed while running.
    #[error("Execution error: {0}")]
    Execution(NativeError),
    /// The caller broke a precondition of the API.
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Value error: {0}")]
    Value(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),
}

impl DbError {
    pub fn usage(msg: impl Into<String>) -> Self {
        DbError::Usage(msg.into())
    }

    /// The backend error carried by this error, if any.
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            DbError::Connection(e) | DbError::Prepare(e) | DbError::Execution(e) => Some(e),
            _ => None,
        }
    }

    pub fn native_code(&self) -> Option<i32> {
        self.native().and_then(|e| e.code)
    }
}

impl serde::de::Error for DbError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DbError::Value(msg.to_string())
    }
}

impl serde::ser::Error for DbError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DbError::Value(msg.to_string())
    }
}

#[cfg(feature = "mysql")]
pub(crate) fn mysql_native(e: &mysql_async::Error) -> NativeError {
    match e {
        mysql_async::Error::Server(se) => NativeError::new(
            Some(i32::from(se.code)),
            Some(se.state.clone()),
            se.message.clone(),
        ),
        other => NativeError::client(other.to_string()),
    }
}

#[cfg(feature = "sqlite")]
pub(crate) fn sqlite_native(e: &rusqlite::Error) -> NativeError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg) => NativeError::new(
            Some(err.extended_code),
            None,
            msg.clone().unwrap_or_else(|| err.to_string()),
        ),
        rusqlite::Error::SqlInputError { error, msg, .. } => {
            NativeError::new(Some(error.extended_code), None, msg.clone())
        }
        other => NativeError::client(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_display() {
        let e = NativeError::new(Some(1062), Some("23000".into()), "Duplicate entry");
        assert_eq!(e.to_string(), "[1062] (23000) Duplicate entry");
        assert_eq!(NativeError::client("broken pipe").to_string(), "broken pipe");
    }

    #[test]
    fn test_native_code_survives_wrapping() {
        let err = DbError::Execution(NativeError::new(Some(19), None, "UNIQUE constraint failed"));
        assert_eq!(err.native_code(), Some(19));
        assert!(err.to_string().starts_with("Execution error: [19]"));
        assert!(DbError::usage("x").native().is_none());
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_sqlite_native_keeps_extended_code() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.prepare("SELEC 1").unwrap_err();
        let native = sqlite_native(&err);
        assert_eq!(native.code, Some(1));
        assert!(native.message.contains("syntax error"));
    }
}
