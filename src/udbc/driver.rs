use crate::error::DbError;
use crate::models::db_type::DatabaseType;
use crate::udbc::connection::Connection;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    fn db_type(&self) -> DatabaseType;

    async fn connection(&self) -> Result<Arc<dyn Connection>, DbError>;
    async fn close(&self) -> Result<(), DbError>;
}
