//! pg-meminfo - version 0.1.0
//!
//! Per-process unique resident memory report with tracing logging.
//! This is the main entry point that resolves configuration and dispatches
//! the report or a subcommand.

mod commands;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};

use commands::{command_check, command_config, command_report};
use pg_meminfo::cli::{Args, Commands, LogLevel};
use pg_meminfo::config::{resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging on stderr with the configured log level.
fn setup_logging(config: &Config) {
    let level = match config.log_level() {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    debug!("Logging initialized with level: {:?}", config.log_level());
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return Ok(show_config(&config, args.config_format)?);
    }

    // Generating a config file needs no effective configuration
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), *format, *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config);

    let result = match &args.command {
        Some(Commands::Check {
            proc,
            memory,
            database,
            all,
        }) => command_check(*proc, *memory, *database, *all, &config),
        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
        None => command_report(&config),
    };

    if let Err(e) = result {
        error!("Report failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
    Ok(())
}
