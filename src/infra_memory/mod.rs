//! In-process adapters. They back the `memory` backends in settings and the
//! test suites; nothing here survives a restart.

mod entry_repo_memory;
mod session_store_memory;
mod user_repo_memory;

pub use entry_repo_memory::*;
pub use session_store_memory::*;
pub use user_repo_memory::*;
