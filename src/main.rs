mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use vogel_core::config::Config;
use vogel_server::images::ImageStore;
use vogel_store::queries::{observations, species};
use vogel_store::JsonStore;

/// Config file (if any) with environment overrides applied.
fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env();
    config
}

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path);

    // CLI flags win over config file and environment.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting vogelvortrag server");
    tracing::info!(
        "Server will listen on {}:{}, data file {}",
        config.server.host,
        config.server.port,
        config.storage.data_file.display()
    );

    vogel_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vogelvortrag=trace,vogel_server=trace,vogel_store=debug,vogel_core=debug,tower_http=debug".to_string()
        } else {
            "vogelvortrag=info,vogel_server=info,vogel_store=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate { config } => validate_config(config.as_deref().or(cli.config.as_deref())),
        Commands::Stats => show_stats(cli.config.as_deref()),
        Commands::ClearCache => clear_cache(cli.config.as_deref()),
        Commands::Version => {
            println!("vogelvortrag {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read {}", p.display()))?;
            Config::from_json(&contents)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Data file: {}", config.storage.data_file.display());
    println!("  Uploads: {}", config.uploads.dir.display());
    println!("  Image cache: {}", config.uploads.cache_dir().display());
    println!(
        "  Images: quality {}, max dimension {}",
        config.images.default_quality, config.images.max_dimension
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("Warnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}

fn show_stats(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let store = JsonStore::open(&config.storage.data_file)
        .with_context(|| format!("Failed to open {}", config.storage.data_file.display()))?;
    let images = ImageStore::new(config.uploads.dir.clone(), config.uploads.cache_dir());

    println!("Data file: {}", store.path().display());
    println!("  Species: {}", species::species_count(&store)?);
    println!("  Observations: {}", observations::observation_count(&store)?);
    println!("Uploads: {}", images.upload_dir().display());
    println!("  Images: {}", images.upload_count()?);
    println!("  Cached derivatives: {}", images.cache_count()?);
    Ok(())
}

fn clear_cache(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let images = ImageStore::new(config.uploads.dir.clone(), config.uploads.cache_dir());

    let removed = images.clear_cache()?;
    tracing::info!(cache = %images.cache_dir().display(), removed, "Image cache cleared");
    println!("Removed {removed} cached image(s) from {}", images.cache_dir().display());
    Ok(())
}
