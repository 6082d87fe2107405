//! Common types and utilities shared across the TWD converter components

pub mod config;
pub mod error;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
