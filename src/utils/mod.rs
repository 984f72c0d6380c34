pub mod config;
pub mod error;
pub mod tracing;
pub mod types;
