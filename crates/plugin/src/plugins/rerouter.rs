//! ReRouter Plugin
//!
//! Rewrites GitHub alias hosts to github.com URLs and stamps diagnostic
//! headers before the request is handed on:
//!
//! ```text
//! gh.someone.tl/repo   -> github.com/someone/repo
//! gh.alexheld.io/tool  -> github.com/alex-held/tool
//! ```
//!
//! Requests that cannot be rerouted are answered with 421 Misdirected Request
//! and left untouched.

use crate::context::PluginContext;
use crate::error::{PluginError, Result};
use crate::hooks::{HookAction, RequestFilterHook, RequestInfo};
use crate::plugin::{Plugin, PluginCapabilities, PluginMetadata, PluginType};
use crate::priority::HookPriority;
use async_trait::async_trait;
use parking_lot::RwLock;
use config::{HeaderNames, RerouterConfig, ShallowHosts};
use engine::{
    classify_and_rewrite, Reroute, RewriteObserver, Rules, ShallowHostPolicy, TracingObserver,
};
use std::any::Any;
use std::sync::Arc;

/// Context key holding the forwarded URL
pub const REROUTED_URL_KEY: &str = "rerouted_url";

/// Engine rules described by a `[rerouter]` section
pub fn rules_from_config(config: &RerouterConfig) -> Rules {
    Rules {
        github_aliases: config.github_aliases.clone(),
        own_domain: config.own_domain.clone(),
        own_namespace: config.own_namespace.clone(),
        shallow_hosts: match config.shallow_hosts {
            ShallowHosts::Reject => ShallowHostPolicy::Reject,
            ShallowHosts::PassThrough => ShallowHostPolicy::PassThrough,
        },
    }
}

/// Immutable state shared by every request
struct RerouterState {
    rules: Rules,
    version: String,
    headers: HeaderNames,
    observer: Arc<dyn RewriteObserver>,
}

impl RerouterState {
    fn decorate(&self, request: &mut RequestInfo, reroute: &Reroute) {
        let original = reroute.original.to_string();
        let rewritten = reroute.rewritten.to_string();

        request.set_url(&reroute.rewritten);
        request.set_header("host", reroute.rewritten.authority());
        request.set_header(&self.headers.version, self.version.as_str());
        request.set_header(&self.headers.default_url, original);
        request.set_header(&self.headers.rerouted_url, rewritten);
    }
}

/// Running state, shared between the plugin and every hook it handed out.
/// `None` while stopped.
type SharedState = Arc<RwLock<Option<Arc<RerouterState>>>>;

/// ReRouter Plugin
pub struct RerouterPlugin {
    metadata: PluginMetadata,
    config: RerouterConfig,
    observer: Arc<dyn RewriteObserver>,
    state: SharedState,
}

impl RerouterPlugin {
    pub fn new() -> Self {
        Self::with_observer(Arc::new(TracingObserver))
    }

    /// Create a plugin that reports outcomes to `observer`
    pub fn with_observer(observer: Arc<dyn RewriteObserver>) -> Self {
        let metadata =
            PluginMetadata::new("rerouter", config::DEFAULT_VERSION, PluginType::Middleware)
                .with_description("Rewrites GitHub alias hosts to github.com")
                .with_capabilities(PluginCapabilities {
                    supports_reload: true,
                    thread_safe: true,
                });

        Self {
            metadata,
            config: RerouterConfig::default(),
            observer,
            state: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> &RerouterConfig {
        &self.config
    }

    /// Hook bound to this plugin's state, once started.
    ///
    /// The hook follows later `reload` and `stop` calls.
    pub fn get_hook(&self) -> Option<RerouterHook> {
        self.state.read().as_ref().map(|_| RerouterHook {
            state: self.state.clone(),
        })
    }
}

impl Default for RerouterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for RerouterPlugin {
    fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    fn init(&mut self, config: &str) -> Result<()> {
        let parsed = if config.trim().is_empty() {
            RerouterConfig::default()
        } else {
            serde_json::from_str(config).map_err(|e| PluginError::ConfigError(e.to_string()))?
        };
        parsed
            .validate()
            .map_err(|e| PluginError::ConfigError(e.to_string()))?;

        self.metadata.version = parsed.version.clone();
        self.config = parsed;
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        let state = RerouterState {
            rules: rules_from_config(&self.config),
            version: self.config.version.clone(),
            headers: self.config.headers.clone(),
            observer: self.observer.clone(),
        };
        *self.state.write() = Some(Arc::new(state));
        tracing::info!(
            version = %self.config.version,
            aliases = ?self.config.github_aliases,
            shallow_hosts = ?self.config.shallow_hosts,
            "ReRouter plugin started"
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        *self.state.write() = None;
        tracing::info!("ReRouter plugin stopped");
        Ok(())
    }

    /// Swap in the new configuration. A rejected config keeps the old one running.
    fn reload(&mut self, config: &str) -> Result<()> {
        self.init(config)?;
        self.start()
    }

    fn health_check(&self) -> bool {
        self.state.read().is_some()
    }

    fn request_filter_hook(&self) -> Option<Arc<dyn RequestFilterHook>> {
        self.get_hook()
            .map(|hook| Arc::new(hook) as Arc<dyn RequestFilterHook>)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Per-request rerouting hook
pub struct RerouterHook {
    state: SharedState,
}

impl RerouterHook {
    fn current(&self) -> Result<Arc<RerouterState>> {
        self.state
            .read()
            .clone()
            .ok_or_else(|| PluginError::StateError("rerouter plugin is stopped".to_string()))
    }
}

#[async_trait]
impl RequestFilterHook for RerouterHook {
    fn priority(&self) -> HookPriority {
        HookPriority::REWRITE
    }

    async fn on_request(
        &self,
        request: &mut RequestInfo,
        ctx: &mut PluginContext,
    ) -> Result<HookAction> {
        let state = self.current()?;
        let rerouted = request
            .url()
            .and_then(|url| classify_and_rewrite(&url, &state.rules));

        match rerouted {
            Ok(reroute) => {
                state.observer.on_reroute(&reroute);
                state.decorate(request, &reroute);
                ctx.set(REROUTED_URL_KEY, reroute.rewritten.to_string());
                Ok(HookAction::Continue)
            }
            Err(e) => {
                let url = request
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| request.path.clone());
                state.observer.on_failure(&url, &e);
                ctx.respond(e.status_code().as_u16(), e.to_string());
                Ok(HookAction::ShortCircuit)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::RerouteError;
    use parking_lot::Mutex;

    fn started(config: &str) -> RerouterHook {
        let mut plugin = RerouterPlugin::new();
        plugin.init(config).unwrap();
        plugin.start().unwrap();
        plugin.get_hook().unwrap()
    }

    fn request(url: &str) -> RequestInfo {
        RequestInfo::from_url("GET", &url.parse().unwrap())
    }

    #[test]
    fn test_plugin_creation() {
        let plugin = RerouterPlugin::new();
        assert_eq!(plugin.metadata().name, "rerouter");
        assert_eq!(plugin.metadata().version, "v0.0.6");
        assert_eq!(plugin.metadata().plugin_type, PluginType::Middleware);
    }

    #[test]
    fn test_config_parsing() {
        let mut plugin = RerouterPlugin::new();
        let config = r#"{"version": "v1.0.0", "shallow_hosts": "pass_through", "headers": {"version": "X-Acme-Version"}}"#;
        plugin.init(config).unwrap();
        assert_eq!(plugin.config().version, "v1.0.0");
        assert_eq!(plugin.config().shallow_hosts, ShallowHosts::PassThrough);
        assert_eq!(plugin.config().headers.version, "X-Acme-Version");
        assert_eq!(plugin.metadata().version, "v1.0.0");
    }

    #[test]
    fn test_invalid_config() {
        let mut plugin = RerouterPlugin::new();
        assert!(matches!(plugin.init("{not json"), Err(PluginError::ConfigError(_))));
        let colliding = r#"{"headers": {"version": "X-Same", "default_url": "X-Same"}}"#;
        assert!(matches!(plugin.init(colliding), Err(PluginError::ConfigError(_))));
    }

    #[test]
    fn test_start_stop() {
        let mut plugin = RerouterPlugin::new();
        plugin.init("").unwrap();
        assert!(!plugin.health_check());
        plugin.start().unwrap();
        assert!(plugin.health_check());
        assert!(plugin.request_filter_hook().is_some());

        plugin.stop().unwrap();
        assert!(!plugin.health_check());
        assert!(plugin.get_hook().is_none());
    }

    #[tokio::test]
    async fn test_third_party_alias_is_rerouted() {
        let hook = started("");
        let mut req = request("https://gh.someone.tl/repo/file.go");
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::Continue);
        assert_eq!(req.host.as_deref(), Some("github.com"));
        assert_eq!(req.path, "/someone/repo/file.go");
        assert_eq!(req.header("host"), Some("github.com"));
        assert_eq!(req.header("X-ReRouter-Version"), Some("v0.0.6"));
        assert_eq!(
            req.header("X-ReRouter-Default-URL"),
            Some("https://gh.someone.tl/repo/file.go")
        );
        assert_eq!(
            req.header("X-ReRouter-ReRouted-URL"),
            Some("https://github.com/someone/repo/file.go")
        );
        assert_eq!(
            ctx.get::<String>(REROUTED_URL_KEY).as_deref(),
            Some("https://github.com/someone/repo/file.go")
        );
        assert!(ctx.response_status.is_none());
    }

    #[tokio::test]
    async fn test_own_alias_is_rerouted() {
        let hook = started("");
        let mut req = request("https://gh.alexheld.io/tool?tab=readme");
        let mut ctx = PluginContext::default();

        hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(req.path, "/alex-held/tool");
        assert_eq!(req.query.as_deref(), Some("tab=readme"));
        assert_eq!(
            req.header("x-rerouter-rerouted-url"),
            Some("https://github.com/alex-held/tool?tab=readme")
        );
    }

    #[tokio::test]
    async fn test_noop_still_stamps_headers() {
        let hook = started("");
        let mut req = request("http://www.example.com:8080/x");
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::Continue);
        assert_eq!(req.host.as_deref(), Some("www.example.com"));
        assert_eq!(req.port, Some(8080));
        assert_eq!(req.header("host"), Some("www.example.com:8080"));
        assert_eq!(
            req.header("x-rerouter-default-url"),
            req.header("x-rerouter-rerouted-url")
        );
    }

    #[tokio::test]
    async fn test_noop_keeps_port_from_host_header() {
        let hook = started("");
        let mut req = RequestInfo {
            method: "GET".to_string(),
            scheme: "http".to_string(),
            path: "/x".to_string(),
            ..Default::default()
        };
        req.set_header("Host", "www.example.com:8080");
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::Continue);
        assert_eq!(req.header("host"), Some("www.example.com:8080"));
        assert_eq!(req.port, Some(8080));
        assert_eq!(
            req.header("x-rerouter-rerouted-url"),
            Some("http://www.example.com:8080/x")
        );
    }

    #[tokio::test]
    async fn test_header_host_alias_drops_port() {
        let hook = started("");
        let mut req = RequestInfo {
            method: "GET".to_string(),
            scheme: "https".to_string(),
            path: "/repo".to_string(),
            ..Default::default()
        };
        req.set_header("host", "gh.someone.tl:8443");
        let mut ctx = PluginContext::default();

        hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(req.header("host"), Some("github.com"));
        assert_eq!(req.port, None);
        assert_eq!(
            req.header("x-rerouter-default-url"),
            Some("https://gh.someone.tl:8443/repo")
        );
    }

    #[tokio::test]
    async fn test_reload_reaches_running_hook() {
        let mut plugin = RerouterPlugin::new();
        plugin.init("").unwrap();
        plugin.start().unwrap();
        let hook = plugin.get_hook().unwrap();

        plugin
            .reload(r#"{"own_namespace": "someone-else", "version": "v0.0.7"}"#)
            .unwrap();

        let mut req = request("https://gh.alexheld.io/tool");
        let mut ctx = PluginContext::default();
        hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(req.path, "/someone-else/tool");
        assert_eq!(req.header("x-rerouter-version"), Some("v0.0.7"));
    }

    #[tokio::test]
    async fn test_rejected_reload_keeps_running_config() {
        let mut plugin = RerouterPlugin::new();
        plugin.init("").unwrap();
        plugin.start().unwrap();
        let hook = plugin.get_hook().unwrap();

        assert!(plugin.reload(r#"{"version": ""}"#).is_err());
        assert!(plugin.health_check());

        let mut req = request("https://gh.alexheld.io/tool");
        let mut ctx = PluginContext::default();
        hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(req.path, "/alex-held/tool");
    }

    #[tokio::test]
    async fn test_stopped_hook_refuses_requests() {
        let mut plugin = RerouterPlugin::new();
        plugin.init("").unwrap();
        plugin.start().unwrap();
        let hook = plugin.get_hook().unwrap();
        plugin.stop().unwrap();

        let mut req = request("https://gh.someone.tl/repo");
        let before = req.clone();
        let mut ctx = PluginContext::default();
        let err = hook.on_request(&mut req, &mut ctx).await.unwrap_err();
        assert!(matches!(err, PluginError::StateError(_)));
        assert_eq!(req.path, before.path);
        assert_eq!(req.headers, before.headers);
    }

    #[tokio::test]
    async fn test_failure_answers_421_and_leaves_request() {
        let hook = started("");
        let mut req = request("https://a.b/x");
        let before = req.clone();
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::ShortCircuit);
        assert_eq!(ctx.response_status, Some(421));
        let body = String::from_utf8(ctx.response_body.clone().unwrap().to_vec()).unwrap();
        assert!(body.contains("a.b"));

        assert_eq!(req.host, before.host);
        assert_eq!(req.path, before.path);
        assert_eq!(req.headers, before.headers);
        assert!(ctx.get::<String>(REROUTED_URL_KEY).is_none());
    }

    #[tokio::test]
    async fn test_pass_through_policy() {
        let hook = started(r#"{"shallow_hosts": "pass_through"}"#);
        let mut req = request("https://example.com/x");
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::Continue);
        assert_eq!(
            req.header("x-rerouter-rerouted-url"),
            Some("https://example.com/x")
        );
    }

    #[tokio::test]
    async fn test_missing_host_is_misdirected() {
        let hook = started("");
        let mut req = RequestInfo {
            method: "GET".to_string(),
            scheme: "https".to_string(),
            path: "/x".to_string(),
            ..Default::default()
        };
        let mut ctx = PluginContext::default();

        let action = hook.on_request(&mut req, &mut ctx).await.unwrap();
        assert_eq!(action, HookAction::ShortCircuit);
        assert_eq!(ctx.response_status, Some(421));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl RewriteObserver for Recorder {
        fn on_reroute(&self, reroute: &Reroute) {
            self.events.lock().push(format!("ok {}", reroute.strategy));
        }

        fn on_failure(&self, url: &str, _error: &RerouteError) {
            self.events.lock().push(format!("err {}", url));
        }
    }

    #[tokio::test]
    async fn test_observer_sees_outcomes() {
        let recorder = Arc::new(Recorder::default());
        let mut plugin = RerouterPlugin::with_observer(recorder.clone());
        plugin.init("").unwrap();
        plugin.start().unwrap();
        let hook = plugin.get_hook().unwrap();

        let mut ctx = PluginContext::default();
        hook.on_request(&mut request("https://gh.someone.tl/x"), &mut ctx)
            .await
            .unwrap();
        hook.on_request(&mut request("https://a.b/x"), &mut ctx)
            .await
            .unwrap();

        let events = recorder.events.lock().clone();
        assert_eq!(
            events,
            vec![
                "ok third-party-alias(someone)".to_string(),
                "err https://a.b/x".to_string()
            ]
        );
    }
}
