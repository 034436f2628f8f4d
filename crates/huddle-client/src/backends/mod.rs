//! Backend implementations.

pub mod http;
pub mod local;
