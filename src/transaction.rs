use crate::error::DbError;
use crate::executor::store::DataStore;
use std::ops::Deref;
use std::sync::atomic::Ordering;
use tracing::warn;

/// An open transaction on a [`DataStore`].
///
/// Statements are issued through the guard, which dereferences to the store.
/// Dropping it without `commit` or `rollback` abandons the transaction: the
/// store rolls it back before it sends anything else to the backend, so no
/// later statement runs inside it.
pub struct Transaction<'s> {
    store: &'s DataStore,
    finished: bool,
}

impl<'s> Transaction<'s> {
    pub(crate) async fn begin(store: &'s DataStore) -> Result<Self, DbError> {
        store.begin_transaction().await?;
        Ok(Self {
            store,
            finished: false,
        })
    }

    /// On failure the guard is dropped unfinished and the transaction is
    /// rolled back.
    pub async fn commit(mut self) -> Result<(), DbError> {
        let result = self.store.commit().await;
        if result.is_ok() {
            self.finished = true;
        }
        result
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        self.finished = true;
        self.store.rollback().await
    }
}

impl Deref for Transaction<'_> {
    type Target = DataStore;

    fn deref(&self) -> &DataStore {
        self.store
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("transaction dropped without commit or rollback; rolling back before the next statement");
        self.store.rollback_pending.store(true, Ordering::Release);
    }
}
