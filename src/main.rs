//! apworld-forge CLI: build and serve the Chatipelago APWorld.
//!
//! `serve` runs the HTTP service; `generate` rebuilds from the last persisted
//! world description without starting a server.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use apworld_forge::{BuildPipeline, Config, api, loader, shutdown_signal};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// apworld-forge: turn a YAML item/location list into an APWorld.
#[derive(Parser)]
#[command(
    name = "apworld-forge",
    version,
    about = "Generate, build and serve the Chatipelago APWorld from a YAML item/location list.",
    long_about = None,
)]
struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file.
    #[arg(long, env = "APWORLD_FORGE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Archipelago checkout the builder runs in.
    #[arg(long, env = "APWORLD_FORGE_ROOT", global = true)]
    root: Option<PathBuf>,

    /// World name passed to the builder.
    #[arg(long, env = "APWORLD_FORGE_WORLD", global = true)]
    world: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to bind (default: loopback).
        #[arg(long, env = "APWORLD_FORGE_HOST")]
        host: Option<IpAddr>,

        /// Port to bind.
        #[arg(long, env = "APWORLD_FORGE_PORT")]
        port: Option<u16>,

        /// Listen on all interfaces.
        #[arg(long, conflicts_with = "host")]
        public: bool,
    },

    /// Build once from the persisted world description and print the artifact path.
    Generate,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "apworld_forge=info,tower_http=info",
        1 => "apworld_forge=debug,tower_http=debug",
        _ => "apworld_forge=trace,tower_http=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)
            .wrap_err_with(|| format!("cannot load configuration from '{}'", path.display()))?,
        None => Config::default(),
    };

    if let Some(root) = &cli.root {
        apply_root(&mut config, root);
    }
    if let Some(world) = &cli.world {
        config.builder.world_name = world.clone();
    }
    if let Command::Serve { host, port, public } = &cli.command {
        if *public {
            config.api.bind_address.set_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        if let Some(host) = host {
            config.api.bind_address.set_ip(*host);
        }
        if let Some(port) = port {
            config.api.bind_address.set_port(*port);
        }
    }

    config.validate()?;
    Ok(config)
}

/// Re-base the builder-side paths on an Archipelago checkout.
///
/// Absolute paths from the configuration file are kept.
fn apply_root(config: &mut Config, root: &Path) {
    config.paths.names_dir = root.join(&config.paths.names_dir);
    config.paths.build_output = root.join(&config.paths.build_output);
    config.builder.working_dir = Some(match &config.builder.working_dir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    });
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    match cli.command {
        Command::Serve { .. } => cmd_serve(config).await,
        Command::Generate => cmd_generate(config).await,
    }
}

async fn cmd_serve(config: Config) -> Result<()> {
    let address = config.api.bind_address;
    if !address.ip().is_loopback() {
        tracing::warn!(address = %address, "listening on a non-loopback address");
    }

    let config = Arc::new(config);
    let pipeline = Arc::new(BuildPipeline::from_config(&config));

    api::start_api_server(config, pipeline, shutdown_signal())
        .await
        .wrap_err_with(|| format!("cannot serve on {address}"))
}

async fn cmd_generate(config: Config) -> Result<()> {
    let world = loader::load_world_config(&config.paths.config_file).await?;
    let pipeline = BuildPipeline::from_config(&config);
    let artifact = pipeline.build(&world).await?;

    info!(artifact = %artifact.display(), "generation complete");
    println!("{}", artifact.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli);
    run(cli).await
}
