//! Schema registry
//!
//! Keeps the resolved schema classes in step with the remote service.

mod client;
mod sisdb;

pub use client::{MemoryClient, SchemaClient};
pub use sisdb::SisDb;
