//! Hub error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("Hub task is not running")]
    Closed,
}

pub type HubResult<T> = Result<T, HubError>;
