use anyhow::Result;
use clap::{Parser, Subcommand};
use pocketcam::{
    orientation_category, speed_category, EventBus, LocalFilesystem, MediaCatalog,
    PocketcamConfig, RenameRequest, TelemetrySample,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pocketcam")]
#[command(about = "Capture-to-catalog media manager")]
#[command(version)]
#[command(long_about = "Manages the pocketcam media catalog: list, rename and delete \
committed captures, and classify telemetry readings into display categories.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "pocketcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog entries
    List {
        /// Emit JSON instead of one name per line
        #[arg(long)]
        json: bool,
    },
    /// Rename a catalog entry
    Rename { path: PathBuf, new_name: String },
    /// Delete a catalog entry
    Remove { path: PathBuf },
    /// Classify a telemetry reading
    Classify {
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        x: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        y: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting pocketcam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match PocketcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    let Some(command) = args.command else {
        println!("No command given; see --help");
        return Ok(());
    };

    run_command(&config, command).await
}

async fn run_command(config: &PocketcamConfig, command: Command) -> Result<()> {
    let event_bus = Arc::new(EventBus::new(config.system.event_bus_capacity));
    let catalog = MediaCatalog::new(
        &config.catalog.path,
        Arc::new(LocalFilesystem::new()),
        event_bus,
    );

    match command {
        Command::List { json } => {
            let entries = catalog.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in entries {
                    println!("{:?}\t{}", entry.kind, entry.display_name);
                }
            }
        }
        Command::Rename { path, new_name } => {
            let entry = catalog
                .apply_rename(&RenameRequest::new(path, new_name))
                .await?;
            println!("Renamed to {}", entry.path.display());
        }
        Command::Remove { path } => {
            catalog.remove(&path).await?;
            println!("Removed {}", path.display());
        }
        Command::Classify { speed, x, y } => {
            let sample = TelemetrySample {
                speed,
                x,
                y,
                ..TelemetrySample::default()
            };
            let speed = speed_category(&sample);
            let orientation = orientation_category(&sample);
            println!("speed: {:?} ({})", speed, speed.asset());
            println!("orientation: {:?} ({})", orientation, orientation.asset());
        }
    }

    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pocketcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Pocketcam Configuration File");
    println!("# This is the default configuration with all available options");
    println!();
    println!("{}", PocketcamConfig::default().to_toml()?);
    Ok(())
}
