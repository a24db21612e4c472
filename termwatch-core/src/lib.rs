// termwatch-core/src/lib.rs

pub mod commands;
pub mod config;
pub mod services;

pub use commands::{Commands, InitReport, ensure_initialized_at, ensure_initialized_once};
pub use config::CoreConfig;
pub use services::analyzer::{Analyzer, FileVerdict};
