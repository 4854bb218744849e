//! Startup helpers: logging setup and the startup summary

pub mod logger;

pub use logger::{bootstrap_subscriber, init_logging, StartupLogger};
