//! Built-in plugins for rerouter

pub mod rerouter;

pub use rerouter::{rules_from_config, RerouterHook, RerouterPlugin};

use crate::registry::PluginRegistry;

/// Register all built-in plugins with the registry
pub fn register_builtin_plugins(registry: &PluginRegistry) {
    if let Err(e) = registry.register_factory("rerouter", || Box::new(RerouterPlugin::new())) {
        tracing::warn!(error = %e, "Failed to register rerouter plugin");
    }

    tracing::info!("Registered built-in plugins");
}
