use std::sync::Arc;

use crate::error::DbError;
use crate::models::db_config::DbConfig;
use crate::models::db_type::DatabaseType;
use crate::udbc::driver::Driver;

/// Builds the driver matching `config.db_type`.
///
/// Backends compiled out through cargo features are reported as unsupported.
pub fn build_driver(config: &DbConfig) -> Result<Arc<dyn Driver>, DbError> {
    let driver: Arc<dyn Driver> = match config.db_type {
        #[cfg(feature = "mysql")]
        DatabaseType::MySql => Arc::new(crate::udbc_mysql::MysqlDriver::new(config)?),
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Arc::new(crate::udbc_sqlite::SqliteDriver::new(config)?),
        #[allow(unreachable_patterns)]
        other => return Err(DbError::UnsupportedDatabaseType(other.as_str().into())),
    };
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_build_sqlite_driver() {
        let driver = build_driver(&DbConfig::sqlite(":memory:")).unwrap();
        assert_eq!(driver.db_type(), DatabaseType::Sqlite);
        assert_eq!(driver.name(), crate::udbc::DEFAULT_DB_NAME);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DbConfig::mysql("", "rental", "root", "");
        assert!(matches!(build_driver(&config), Err(DbError::Config(_))
            | Err(DbError::UnsupportedDatabaseType(_))));
    }
}
