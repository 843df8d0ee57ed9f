//! Core Plugin trait definition

use crate::error::Result;
use crate::hooks::RequestFilterHook;
use std::any::Any;
use std::sync::Arc;

/// Plugin type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginType {
    /// Rewrites or annotates the request, then hands it on
    Middleware,
}

/// Plugin capabilities
#[derive(Debug, Clone, Default)]
pub struct PluginCapabilities {
    /// Supports configuration reload without restart
    pub supports_reload: bool,
    /// Is thread-safe (can be called from multiple threads)
    pub thread_safe: bool,
}

/// Plugin metadata
#[derive(Debug, Clone)]
pub struct PluginMetadata {
    /// Unique plugin identifier
    pub name: String,
    /// Semantic version
    pub version: String,
    pub plugin_type: PluginType,
    /// API version this plugin was built against
    pub api_version: u32,
    pub description: String,
    pub capabilities: PluginCapabilities,
}

impl PluginMetadata {
    /// Create new plugin metadata with required fields
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        plugin_type: PluginType,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            plugin_type,
            api_version: crate::PLUGIN_API_VERSION,
            description: String::new(),
            capabilities: PluginCapabilities::default(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_capabilities(mut self, caps: PluginCapabilities) -> Self {
        self.capabilities = caps;
        self
    }
}

/// Contract between the host and a plugin instance
pub trait Plugin: Send + Sync {
    /// Return plugin metadata
    fn metadata(&self) -> &PluginMetadata;

    /// Initialize the plugin with configuration (JSON, empty for defaults)
    fn init(&mut self, config: &str) -> Result<()>;

    /// Start the plugin (begin processing)
    fn start(&mut self) -> Result<()>;

    /// Stop the plugin gracefully
    fn stop(&mut self) -> Result<()>;

    /// Reload plugin configuration without stopping
    fn reload(&mut self, config: &str) -> Result<()> {
        self.stop()?;
        self.init(config)?;
        self.start()
    }

    /// Health check
    fn health_check(&self) -> bool {
        true
    }

    /// Hook to insert into the request chain once started
    fn request_filter_hook(&self) -> Option<Arc<dyn RequestFilterHook>> {
        None
    }

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}
