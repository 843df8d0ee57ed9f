//! Hook traits for the request pipeline

use crate::context::PluginContext;
use crate::error::Result;
use crate::priority::HookPriority;
use async_trait::async_trait;
use http::uri::{Authority, InvalidUri};
use std::collections::HashMap;

/// Hook execution result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HookAction {
    /// Continue to the next hook
    #[default]
    Continue,
    /// Skip remaining hooks, forward the request
    SkipPhase,
    /// Stop here; the response is already set on the context
    ShortCircuit,
}

/// Inbound request as seen by hooks.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: String,
    pub scheme: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Path with its leading `/`
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
}

impl RequestInfo {
    /// Build from an absolute URL
    pub fn from_url(method: impl Into<String>, url: &engine::RequestUrl) -> Self {
        let mut request = Self {
            method: method.into(),
            ..Default::default()
        };
        request.set_url(url);
        request
    }

    /// Absolute URL of this request.
    ///
    /// Without an explicit host, host and port come from the `host` header.
    pub fn url(&self) -> std::result::Result<engine::RequestUrl, engine::RerouteError> {
        let (host, port) = match &self.host {
            Some(host) => (host.clone(), self.port),
            None => {
                let header = self.header("host").ok_or_else(|| {
                    engine::RerouteError::InvalidRequestUrl {
                        url: self.path.clone(),
                        reason: "missing host".to_string(),
                    }
                })?;
                let authority: Authority = header.parse().map_err(|e: InvalidUri| {
                    engine::RerouteError::InvalidRequestUrl {
                        url: header.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                (authority.host().to_string(), authority.port_u16())
            }
        };

        let path = self.path.strip_prefix('/').unwrap_or(&self.path);
        let raw_path = match &self.query {
            Some(q) => format!("{}?{}", path, q),
            None => path.to_string(),
        };

        Ok(engine::RequestUrl::new(self.scheme.clone(), host, port, raw_path))
    }

    /// Replace scheme, host, port, path and query with those of `url`
    pub fn set_url(&mut self, url: &engine::RequestUrl) {
        self.scheme = url.scheme().to_string();
        self.host = Some(url.host().to_string());
        self.port = url.port();
        self.path = url.path();
        self.query = url.query().map(str::to_string);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_lowercase(), value.into());
    }
}

/// Request filter hook, run in priority order before forwarding
#[async_trait]
pub trait RequestFilterHook: Send + Sync {
    fn priority(&self) -> HookPriority {
        HookPriority::NORMAL
    }

    /// Inspect and possibly modify the request
    async fn on_request(
        &self,
        request: &mut RequestInfo,
        ctx: &mut PluginContext,
    ) -> Result<HookAction>;
}
