//! huddle-client: chat backend abstraction, wire types and implementations.

pub mod backends;
mod error;
pub mod roster;
pub mod traits;
pub mod types;

pub use backends::http::{HttpBackend, HttpBackendConfig, DEFAULT_BASE_URL};
pub use backends::local::{LocalBackend, LocalBackendConfig};
pub use error::ClientError;
pub use traits::ChatBackend;
pub use types::{Agent, SendMessageRequest, SendMessageResponse, WireMessage};
