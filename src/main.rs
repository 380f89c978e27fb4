//! IMGW RainGRS CLI application
//!
//! Command-line interface for fetching hourly RainGRS precipitation rasters
//! and extracting point time series from them.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use imgw_raingrs::cli::{handle_acquire, handle_config, handle_series, Cli, Commands};
use imgw_raingrs::config::AppConfig;
use imgw_raingrs::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config.logging.level);

    info!("IMGW RainGRS v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Acquire(args) => {
            info!("Executing acquire command");
            handle_acquire(args, &cli.global, config).await
        }
        Commands::Series(args) => {
            info!("Executing series command");
            handle_series(args, &cli.global, config).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &config).await
        }
    }
}

/// Initialize logging from CLI verbosity and the configured level
fn init_logging(cli: &Cli, configured_level: &str) {
    let log_level = cli.log_level(configured_level);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("imgw_raingrs={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
