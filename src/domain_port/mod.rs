// store

mod session_store;

pub use session_store::*;

// repo

mod entry_repo;
mod user_repo;

pub use entry_repo::*;
pub use user_repo::*;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("duplicate key")]
    Duplicate,
    #[error("store error: {0}")]
    Store(String),
}
