use crate::error::DbError;
use crate::udbc::row::ResultSet;

/// Outcome of a best-effort statement.
///
/// Unlike the `Result`-returning path, a failure here has already been logged
/// and the caller is expected to carry on.
#[must_use]
#[derive(Debug)]
pub enum Attempt {
    Completed(ResultSet),
    Failed(DbError),
}

impl Attempt {
    pub fn is_completed(&self) -> bool {
        matches!(self, Attempt::Completed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Attempt::Failed(_))
    }

    pub fn result(&self) -> Option<&ResultSet> {
        match self {
            Attempt::Completed(rs) => Some(rs),
            Attempt::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DbError> {
        match self {
            Attempt::Completed(_) => None,
            Attempt::Failed(e) => Some(e),
        }
    }

    /// Turns the attempt back into a strict result.
    pub fn into_result(self) -> Result<ResultSet, DbError> {
        match self {
            Attempt::Completed(rs) => Ok(rs),
            Attempt::Failed(e) => Err(e),
        }
    }
}
