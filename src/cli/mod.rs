// ABOUTME: CLI module for the conductor workflow runner
// ABOUTME: Exports command line interface components and main application logic

pub mod app;
pub mod args;
pub mod commands;
pub mod config;

pub use app::App;
pub use args::{Args, Commands};
pub use commands::RunOptions;
pub use config::{Config, ProviderConfig, ProviderKind};
