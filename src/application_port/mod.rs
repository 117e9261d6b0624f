mod auth_service;
mod entry_service;
mod session_service;
mod user_service;

pub use auth_service::*;
pub use entry_service::*;
pub use session_service::*;
pub use user_service::*;
