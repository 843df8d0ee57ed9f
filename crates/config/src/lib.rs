//! config: configuration for rerouter
//!
//! TOML parsing and validation for the rerouting middleware and the
//! command-line front end.

pub mod config;

pub use config::*;
