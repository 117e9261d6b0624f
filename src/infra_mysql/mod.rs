mod entry_repo_mysql;
mod user_repo_mysql;

pub use entry_repo_mysql::*;
pub use user_repo_mysql::*;

mod util;
