//! plugin: middleware plugin system for rerouter
//!
//! Plugins are created from registered factories, configured with JSON and
//! contribute request filter hooks. The [`HookExecutor`] runs those hooks in
//! priority order for every request; a hook either hands the request on or
//! short-circuits with a response.

pub mod context;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod plugin;
pub mod plugins;
pub mod priority;
pub mod registry;

pub use context::PluginContext;
pub use error::{PluginError, Result};
pub use executor::HookExecutor;
pub use hooks::{HookAction, RequestFilterHook, RequestInfo};
pub use plugin::{Plugin, PluginCapabilities, PluginMetadata, PluginType};
pub use plugins::register_builtin_plugins;
pub use priority::HookPriority;
pub use registry::PluginRegistry;

/// Plugin API version for compatibility checking
pub const PLUGIN_API_VERSION: u32 = 1;
