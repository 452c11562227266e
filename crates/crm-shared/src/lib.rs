//! # CRM Shared
//!
//! Configuration, telemetry, and small helpers shared by every CRM crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod telemetry;
pub mod types;
pub mod utils;

pub use error::AppError;
pub use types::*;
