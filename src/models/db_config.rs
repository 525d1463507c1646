use crate::error::DbError;
use crate::models::db_type::DatabaseType;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Settings for one database.
///
/// Errors are always raised as `DbError` and statements are always prepared
/// on the server; neither is configurable.
#[derive(Clone)]
pub struct DbConfig {
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u16,
    /// Schema name for MySQL, file path (or `:memory:`) for SQLite.
    pub database: String,
    pub username: String,
    pub password: String,
    pub charset: String,
    /// Keep the connection in the driver's pool when a store is closed.
    pub persistent: bool,
    pub connect_timeout: Option<Duration>,
    /// Pool limits; MySQL only.
    pub max_open_conns: u64,
    pub max_idle_conns: u64,
}

impl DbConfig {
    pub fn mysql(
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        DbConfig {
            db_type: DatabaseType::MySql,
            host: host.into(),
            port: DEFAULT_MYSQL_PORT,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            charset: DEFAULT_CHARSET.to_string(),
            persistent: true,
            connect_timeout: None,
            max_open_conns: 10,
            max_idle_conns: 2,
        }
    }

    pub fn sqlite(path: impl Into<String>) -> Self {
        DbConfig {
            db_type: DatabaseType::Sqlite,
            host: String::new(),
            port: 0,
            database: path.into(),
            username: String::new(),
            password: String::new(),
            charset: "UTF-8".to_string(),
            persistent: true,
            connect_timeout: None,
            max_open_conns: 1,
            max_idle_conns: 1,
        }
    }

    /// Reads `DB_*` variables from the process environment.
    pub fn from_env() -> Result<Self, DbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DbError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let db_type: DatabaseType = get("DB_DRIVER")
            .as_deref()
            .unwrap_or("mysql")
            .parse()?;

        let mut config = match db_type {
            DatabaseType::Sqlite => {
                DbConfig::sqlite(get("DB_NAME").unwrap_or_else(|| ":memory:".to_string()))
            }
            DatabaseType::MySql => {
                let database = get("DB_NAME")
                    .ok_or_else(|| DbError::Config("DB_NAME is required for mysql".into()))?;
                let mut config = DbConfig::mysql(
                    get("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                    database,
                    get("DB_USER").unwrap_or_else(|| "root".to_string()),
                    lookup("DB_PASS").unwrap_or_default(),
                );
                if let Some(port) = get("DB_PORT") {
                    config.port = port
                        .trim()
                        .parse()
                        .map_err(|_| DbError::Config(format!("invalid DB_PORT '{}'", port)))?;
                }
                if let Some(charset) = get("DB_CHARSET") {
                    config.charset = charset;
                }
                config
            }
        };

        if let Some(persistent) = get("DB_PERSISTENT") {
            config.persistent = parse_flag(&persistent)
                .ok_or_else(|| DbError::Config(format!("invalid DB_PERSISTENT '{}'", persistent)))?;
        }
        if let Some(secs) = get("DB_CONNECT_TIMEOUT") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| DbError::Config(format!("invalid DB_CONNECT_TIMEOUT '{}'", secs)))?;
            config.connect_timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn max_open_conns(mut self, max_open_conns: u64) -> Self {
        self.max_open_conns = max_open_conns;
        self
    }

    pub fn max_idle_conns(mut self, max_idle_conns: u64) -> Self {
        self.max_idle_conns = max_idle_conns;
        self
    }

    /// Checks the fields a driver interpolates into its own setup.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.database.is_empty() {
            return Err(DbError::Config("database name is empty".into()));
        }
        if self.db_type == DatabaseType::MySql {
            if self.host.is_empty() {
                return Err(DbError::Config("host is empty".into()));
            }
            let charset_ok = !self.charset.is_empty()
                && self
                    .charset
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !charset_ok {
                return Err(DbError::Config(format!("invalid charset '{}'", self.charset)));
            }
            if self.max_idle_conns > self.max_open_conns {
                return Err(DbError::Config(
                    "max_idle_conns cannot exceed max_open_conns".into(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("db_type", &self.db_type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("charset", &self.charset)
            .field("persistent", &self.persistent)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
