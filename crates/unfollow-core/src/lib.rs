mod outcome;
mod page;
mod status;
mod user;
pub mod wire;

pub use self::outcome::Outcome;
pub use self::page::{Page, PageError, PageResult};
pub use self::status::{ProcessStatus, RunStatus};
pub use self::user::{User, UserId};
