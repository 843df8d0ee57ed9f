//! rerouter: reroute GitHub alias hosts to github.com
//!
//! Runs requests through the same plugin chain a proxy host would use and
//! reports what would be forwarded.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use engine::{classify, RequestUrl};
use plugin::plugins::rules_from_config;
use plugin::{
    register_builtin_plugins, HookAction, HookExecutor, PluginContext, PluginRegistry, RequestInfo,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "rerouter")]
#[command(author, version, about = "Reroute GitHub alias hosts to github.com")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overrides [global] log_level)
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a request through the middleware chain
    Rewrite {
        /// Absolute request URL, e.g. https://gh.someone.tl/repo
        url: String,
        /// HTTP method
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Show the rewrite strategy selected for a host
    Classify {
        host: String,
    },
    /// Validate configuration
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let level_name = cli
        .log_level
        .as_deref()
        .unwrap_or(config.global.log_level.as_str())
        .to_lowercase();
    let level = match level_name.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Rewrite { url, method } => rewrite_request(&config, &url, &method),
        Commands::Classify { host } => classify_host(&config, &host),
        Commands::Validate => validate_config(&config, cli.config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => Ok(Config::default()),
    }
}

fn rewrite_request(config: &Config, url: &str, method: &str) -> Result<()> {
    let url: RequestUrl = url
        .parse()
        .with_context(|| format!("Invalid request URL {:?}", url))?;

    let registry = Arc::new(PluginRegistry::new());
    register_builtin_plugins(&registry);

    let plugin_config =
        serde_json::to_string(&config.rerouter).context("Failed to encode plugin config")?;
    registry
        .create_instance("rerouter", &plugin_config)
        .context("Failed to start rerouter plugin")?;

    let executor = HookExecutor::new(registry.clone());
    let mut request = RequestInfo::from_url(method, &url);
    let mut ctx = PluginContext::new(method.to_string(), request.path.clone());
    ctx.host = request.host.clone();

    let rt = tokio::runtime::Runtime::new()?;
    let action = rt
        .block_on(executor.run_request_filter_hooks(&mut request, &mut ctx))
        .context("Middleware chain failed")?;

    debug!(action = ?action, elapsed = ?ctx.elapsed(), "Middleware chain finished");

    if action == HookAction::ShortCircuit {
        let status = ctx.response_status.unwrap_or(421);
        let body = ctx
            .response_body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();
        bail!("Request refused with status {}: {}", status, body);
    }

    let forwarded = request.url().context("Rewritten request has no URL")?;
    println!("{} {}", request.method, forwarded);

    let mut headers: Vec<_> = request.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        println!("  {}: {}", name, value);
    }

    Ok(())
}

fn classify_host(config: &Config, host: &str) -> Result<()> {
    let rules = rules_from_config(&config.rerouter);
    match classify(host, &rules) {
        Ok(strategy) => {
            println!("{}", strategy);
            Ok(())
        }
        Err(e) => bail!("{} (status 421)", e),
    }
}

fn validate_config(config: &Config, path: Option<&Path>) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    info!(path = ?path, "Configuration validated");

    let rerouter = &config.rerouter;
    println!("Configuration is valid!");
    println!("  Version: {}", rerouter.version);
    println!("  GitHub aliases: {:?}", rerouter.github_aliases);
    println!("  Own alias: {} -> {}", rerouter.own_domain, rerouter.own_namespace);
    println!("  Shallow hosts: {:?}", rerouter.shallow_hosts);
    let [version, default_url, rerouted_url] = rerouter.headers.all();
    println!("  Headers: {}, {}, {}", version, default_url, rerouted_url);

    Ok(())
}
