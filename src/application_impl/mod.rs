mod auth_service_impl;
mod entry_service_impl;
mod request_authenticator;
mod session_manager_impl;
mod token_issuer_jwt;
mod user_service_impl;

pub use auth_service_impl::*;
pub use entry_service_impl::*;
pub use request_authenticator::*;
pub use session_manager_impl::*;
pub use token_issuer_jwt::*;
pub use user_service_impl::*;
