use crate::error::DbError;
use crate::udbc::param::Params;
use crate::udbc::row::ResultSet;
use async_trait::async_trait;

/// One live connection to a backend.
///
/// Implementations serialize access to the underlying handle, but statements
/// issued from several tasks still share one session and one transaction.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Compiles `sql` on the backend without running it.
    async fn prepare(&self, sql: &str) -> Result<(), DbError>;

    async fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, DbError>;

    /// Id generated by the most recent insert on this connection.
    async fn last_insert_id(&self) -> Result<Option<String>, DbError>;

    // ---------- transaction ----------
    async fn begin(&self) -> Result<(), DbError>;
    async fn commit(&self) -> Result<(), DbError>;
    async fn rollback(&self) -> Result<(), DbError>;

    /// Releases the handle. Further calls fail with a connection error.
    async fn close(&self) -> Result<(), DbError>;
}
