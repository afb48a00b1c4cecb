//! # Domain Layer
//!
//! Scenarios, messages, conversation history and sessions.
//! This layer is independent of the HTTP client and server frameworks.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
