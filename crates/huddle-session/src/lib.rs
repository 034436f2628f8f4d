//! huddle-session: per-session message cache with snapshot and rollback.

pub mod cache;
mod error;
pub mod message;

pub use cache::{Revision, Rollback, SessionCache, Snapshot};
pub use error::SessionError;
pub use message::{Author, Message, MessageId};
