//! Plugin registry for managing plugin instances

use crate::error::{PluginError, Result};
use crate::hooks::RequestFilterHook;
use crate::plugin::Plugin;
use crate::priority::HookPriority;
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Plugin factory function type
pub type PluginFactory = fn() -> Box<dyn Plugin>;

/// Registered hook with its owning plugin
struct RegisteredHook<T> {
    name: String,
    hook: T,
}

type HookTable<T> = RwLock<BTreeMap<HookPriority, Vec<RegisteredHook<T>>>>;

/// Registry of plugin factories, live instances and their hooks
pub struct PluginRegistry {
    factories: RwLock<HashMap<String, PluginFactory>>,
    instances: RwLock<HashMap<String, Arc<RwLock<Box<dyn Plugin>>>>>,
    request_filter_hooks: HookTable<Arc<dyn RequestFilterHook>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            request_filter_hooks: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a plugin factory
    pub fn register_factory(&self, name: &str, factory: PluginFactory) -> Result<()> {
        let mut factories = self.factories.write();
        if factories.contains_key(name) {
            return Err(PluginError::AlreadyRegistered(name.to_string()));
        }
        factories.insert(name.to_string(), factory);
        info!(plugin = %name, "Registered plugin factory");
        Ok(())
    }

    /// Create, initialize and start a plugin instance, then wire its hook.
    ///
    /// The instance table stays locked until the hook is wired.
    pub fn create_instance(&self, name: &str, config: &str) -> Result<()> {
        let mut instances = self.instances.write();
        let slot = match instances.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(PluginError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => slot,
        };

        let factory = self
            .factories
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        let mut plugin = factory();
        let metadata = plugin.metadata().clone();

        if metadata.api_version != crate::PLUGIN_API_VERSION {
            return Err(PluginError::AbiMismatch {
                expected: crate::PLUGIN_API_VERSION,
                actual: metadata.api_version,
            });
        }

        plugin.init(config)?;
        plugin.start()?;

        let hook = plugin.request_filter_hook();
        slot.insert(Arc::new(RwLock::new(plugin)));
        if let Some(hook) = hook {
            self.register_request_filter_hook(name, hook);
        }
        drop(instances);

        info!(
            plugin = %name,
            version = %metadata.version,
            "Created plugin instance"
        );
        Ok(())
    }

    /// Get a plugin instance
    pub fn get_instance(&self, name: &str) -> Option<Arc<RwLock<Box<dyn Plugin>>>> {
        self.instances.read().get(name).cloned()
    }

    /// Stop and remove a plugin instance along with its hooks
    pub fn remove_instance(&self, name: &str) -> Result<()> {
        let instance = self.instances.write().remove(name);
        if let Some(instance) = instance {
            self.unregister_hooks(name);
            instance.write().stop()?;
            info!(plugin = %name, "Removed plugin instance");
        }
        Ok(())
    }

    /// List all registered plugin names
    pub fn list_factories(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// List all active plugin instances
    pub fn list_instances(&self) -> Vec<String> {
        self.instances.read().keys().cloned().collect()
    }

    pub fn has_factory(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.read().len()
    }

    /// Register a request filter hook
    pub fn register_request_filter_hook(&self, name: &str, hook: Arc<dyn RequestFilterHook>) {
        let priority = hook.priority();
        self.request_filter_hooks
            .write()
            .entry(priority)
            .or_default()
            .push(RegisteredHook {
                name: name.to_string(),
                hook,
            });
        debug!(plugin = %name, ?priority, "Registered RequestFilterHook");
    }

    fn unregister_hooks(&self, name: &str) {
        let mut hooks = self.request_filter_hooks.write();
        for registered in hooks.values_mut() {
            registered.retain(|h| h.name != name);
        }
        hooks.retain(|_, v| !v.is_empty());
    }

    /// All request filter hooks in priority order
    pub fn get_request_filter_hooks(&self) -> Vec<Arc<dyn RequestFilterHook>> {
        self.request_filter_hooks
            .read()
            .values()
            .flat_map(|v| v.iter().map(|h| h.hook.clone()))
            .collect()
    }

    /// Stop all plugin instances
    pub fn stop_all(&self) {
        let instances: Vec<_> = self.instances.write().drain().collect();
        for (name, instance) in instances {
            self.unregister_hooks(&name);
            if let Err(e) = instance.write().stop() {
                warn!(plugin = %name, error = %e, "Failed to stop plugin");
            }
        }
        info!("Stopped all plugin instances");
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        self.stop_all();
    }
}
