//! inspector
//!
//! Runs a configured set of inspection commands on every server of a fleet
//! over SSH and prints the results as one table.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use inspector_core::{InspectorConfig, Orchestrator, select_columns};
use inspector_exec::{
    Connector, CredentialSources, Credentials, HostKeyPolicy, LocalConnector, SshConnector,
};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "inspector", version)]
#[command(about = "Run inspection commands across a fleet of servers", long_about = None)]
struct Cli {
    /// Print JSON keyed by host instead of a table
    #[arg(long)]
    json: bool,

    /// Config file (defaults to inspector.yml in the working directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum hosts inspected at once
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Per-host deadline in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Verify host keys against known_hosts
    #[arg(long)]
    strict_host_keys: bool,

    /// Run commands through the local shell instead of SSH
    #[arg(long)]
    local: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log filter, overrides RUST_LOG (e.g. "debug", "inspector_exec=trace")
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// `run <command...>`, an alias name, or nothing for the configured columns
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut InspectorConfig) {
        if let Some(n) = self.concurrency {
            config.run.max_concurrency = Some(n);
        }
        if let Some(secs) = self.timeout {
            config.run.host_timeout_secs = Some(secs);
        }
        if self.strict_host_keys {
            config.connection.host_key_policy = HostKeyPolicy::KnownHosts;
        }
    }
}

fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn build_connector(cli: &Cli, config: &InspectorConfig) -> Result<Arc<dyn Connector>> {
    if cli.local {
        return Ok(Arc::new(LocalConnector::new()));
    }

    let identity_files: Vec<PathBuf> = config
        .connection
        .identity_files
        .iter()
        .map(PathBuf::from)
        .collect();
    let sources = CredentialSources::from_env(&identity_files);
    let credentials = Credentials::resolve(&sources)
        .await
        .wrap_err("cannot authenticate to any server")?;

    Ok(Arc::new(SshConnector::new(
        config.connection.clone(),
        Arc::new(credentials),
    )))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    if cli.no_color {
        colored::control::set_override(false);
    }

    let (path, mut config) = config::load_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config
        .validate()
        .wrap_err_with(|| format!("invalid config {}", path.display()))?;

    let columns = select_columns(&config, &cli.command)?;
    let connector = build_connector(&cli, &config).await?;
    tracing::info!(
        transport = connector.transport(),
        servers = config.servers.len(),
        "inspecting fleet"
    );

    let orchestrator = Orchestrator::new(connector, config.run.orchestrator_options());
    let report = orchestrator.run_all(&config.servers, &columns).await?;

    eprint!("{}", render::render_failures(&report.failures));

    if cli.json {
        println!("{}", render::render_json(&report.aggregate)?);
    } else {
        print!(
            "{}",
            render::render_table(&config.servers, &columns, &report.aggregate, !cli.no_color)
        );
    }

    Ok(())
}
