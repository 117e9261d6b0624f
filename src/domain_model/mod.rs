mod entry;
mod session;
mod unit;
mod user;

pub use entry::*;
pub use session::*;
pub use unit::*;
pub use user::*;
