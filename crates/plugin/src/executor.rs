//! Hook executor for running hooks in priority order

use crate::context::PluginContext;
use crate::error::Result;
use crate::hooks::{HookAction, RequestInfo};
use crate::registry::PluginRegistry;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Runs the registered hook chain for each request
pub struct HookExecutor {
    registry: Arc<PluginRegistry>,
}

impl HookExecutor {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Run all request filter hooks.
    ///
    /// `Continue` means the request should be forwarded to the next handler;
    /// `ShortCircuit` means the response on `ctx` must be sent instead.
    pub async fn run_request_filter_hooks(
        &self,
        request: &mut RequestInfo,
        ctx: &mut PluginContext,
    ) -> Result<HookAction> {
        let hooks = self.registry.get_request_filter_hooks();
        trace!(count = hooks.len(), "Running request filter hooks");

        for hook in hooks {
            match hook.on_request(request, ctx).await {
                Ok(HookAction::Continue) => continue,
                Ok(HookAction::SkipPhase) => {
                    debug!("Request filter hook requested phase skip");
                    return Ok(HookAction::Continue);
                }
                Ok(HookAction::ShortCircuit) => {
                    debug!(
                        status = ?ctx.response_status,
                        "Request filter hook short-circuited request"
                    );
                    return Ok(HookAction::ShortCircuit);
                }
                Err(e) => {
                    warn!(error = %e, "Request filter hook error");
                    return Err(e);
                }
            }
        }

        Ok(HookAction::Continue)
    }
}
