//! silence-cutter library root.

/// Package version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub type Result<T> = error::CutterResult<T>;

pub mod services;
