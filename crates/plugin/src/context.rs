//! Plugin context for passing data through hooks

use bytes::Bytes;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::time::Instant;

/// Per-request state shared by the hook chain
pub struct PluginContext {
    /// Request start time
    pub request_start: Instant,
    /// HTTP method
    pub method: String,
    /// Host as first seen, before any rewrite
    pub host: Option<String>,
    /// Request path as first seen
    pub path: String,
    /// Status to answer with when a hook short-circuits
    pub response_status: Option<u16>,
    /// Body to answer with when a hook short-circuits
    pub response_body: Option<Bytes>,
    /// Plugin-specific data storage (type-erased)
    data: DashMap<(TypeId, String), Box<dyn Any + Send + Sync>>,
}

impl PluginContext {
    /// Create a new plugin context
    pub fn new(method: String, path: String) -> Self {
        Self {
            request_start: Instant::now(),
            method,
            host: None,
            path,
            response_status: None,
            response_body: None,
            data: DashMap::new(),
        }
    }

    /// Store plugin-specific data with a key
    pub fn set<T: Any + Send + Sync + 'static>(&self, key: &str, value: T) {
        let type_id = TypeId::of::<T>();
        self.data.insert((type_id, key.to_string()), Box::new(value));
    }

    /// Retrieve plugin-specific data by key
    pub fn get<T: Any + Send + Sync + Clone + 'static>(&self, key: &str) -> Option<T> {
        let type_id = TypeId::of::<T>();
        self.data
            .get(&(type_id, key.to_string()))
            .and_then(|v| v.downcast_ref::<T>().cloned())
    }

    pub fn contains_key<T: Any + Send + Sync + 'static>(&self, key: &str) -> bool {
        let type_id = TypeId::of::<T>();
        self.data.contains_key(&(type_id, key.to_string()))
    }

    /// Set the response a short-circuiting hook answers with
    pub fn respond(&mut self, status: u16, body: impl Into<Bytes>) {
        self.response_status = Some(status);
        self.response_body = Some(body.into());
    }

    /// Get elapsed time since request start
    pub fn elapsed(&self) -> std::time::Duration {
        self.request_start.elapsed()
    }
}

impl Default for PluginContext {
    fn default() -> Self {
        Self::new(String::new(), String::new())
    }
}
