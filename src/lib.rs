pub mod driver_manager;
pub mod error;
pub mod executor;
pub mod models;
pub mod transaction;
pub mod udbc;
#[cfg(feature = "mysql")]
pub mod udbc_mysql;
#[cfg(feature = "sqlite")]
pub mod udbc_sqlite;

pub use error::{DbError, NativeError};
pub use executor::attempt::Attempt;
pub use executor::statement::PreparedStatement;
pub use executor::store::DataStore;
pub use models::db_config::DbConfig;
pub use models::db_type::DatabaseType;
pub use transaction::Transaction;
pub use udbc::param::ParamType;
pub use udbc::row::{ResultSet, Row};
pub use udbc::value::Value;
