//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Inference backends (Ollama over HTTP, in-process mock)
//! - Scenario registry (in-memory)
//! - Front-ends (CLI routing, REST API, web backend)

pub mod adapter;
pub mod api;
pub mod http;

pub use adapter::*;
pub use api::{Container, ContainerConfig, Router};
