use anyhow::Context;
use clap::Parser;
use pingora_core::server::configuration::Opt;
use pingora_core::server::Server;
use std::path::PathBuf;

use placecreature::app::App;
use placecreature::config::Config;

/// placecreature - placeholder creature images at any size
#[derive(Parser, Debug)]
#[command(name = "placecreature")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,

    /// Import a fixture file and exit
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    placecreature::logging::init_subscriber()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration {}", args.config.display()))?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        config_file = %args.config.display(),
        server_address = %config.server.address,
        server_port = config.server.port,
        namespace = %config.registry.namespace,
        cache_enabled = config.cache.enabled,
        "Configuration loaded successfully"
    );

    // Kept alive for the whole process: stores built here hold connection
    // pools bound to this runtime
    let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
    let app = runtime.block_on(App::build(config.clone()))?;

    if let Some(path) = &args.import {
        let report = runtime.block_on(app.import_file(path))?;
        for (name, err) in &report.failed {
            eprintln!("failed: {}: {}", name, err);
        }
        println!(
            "imported {}, skipped {}, failed {}",
            report.imported.len(),
            report.skipped.len(),
            report.failed.len()
        );
        if !report.is_success() {
            anyhow::bail!("{} fixture entries failed to import", report.failed.len());
        }
        return Ok(());
    }

    if let Some(fixtures) = &config.fixtures {
        let report = runtime.block_on(app.import_file(fixtures))?;
        if !report.is_success() {
            tracing::warn!(
                failed = report.failed.len(),
                "Some fixture entries failed to import"
            );
        }
    }

    let opt = Opt {
        daemon: args.daemon,
        test: args.test,
        upgrade: args.upgrade,
        ..Default::default()
    };

    let mut server = Server::new(Some(opt))
        .map_err(|e| anyhow::anyhow!("Failed to create Pingora server: {}", e))?;
    server.bootstrap();

    let mut service = pingora_proxy::http_proxy_service(&server.configuration, app.service());
    service.threads = Some(config.server.threads);

    let listen_addr = config.server.listen_addr();
    service.add_tcp(&listen_addr);

    tracing::info!(address = %listen_addr, "Starting placecreature");

    server.add_service(service);
    server.run_forever();
}
