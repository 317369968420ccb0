//! Compliance backend API
//!
//! A thin request/response layer over the backend's REST surface: typed
//! operations, canonicalized entity payloads and a client that logs and
//! swallows failures.

pub mod client;
pub mod models;
pub mod operations;

pub use client::{Backend, BackendClient};
pub use models::{CreateFailure, CreatedRecord, Entity, EntityId, EntityKind};
pub use operations::{Collection, Method};
