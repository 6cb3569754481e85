//! locswitch - Switch the location-spoofed device without losing its state
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use locswitch::OutputFormat;
use locswitch_app::config;

/// locswitch - Switch the location-spoofed device without losing its state
#[derive(Parser, Debug)]
#[command(name = "locswitch")]
#[command(about = "Switch the location-spoofed device at runtime", long_about = None)]
struct Args {
    /// Directory holding config.toml and preferences.toml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Run in headless mode (NDJSON events on stdout)
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // Logs go to a file so stdout carries only events
    locswitch_core::logging::init()?;

    let config_dir = args.config_dir.unwrap_or_else(config::default_config_dir);
    let format = if args.headless {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = locswitch::run(&config_dir, format).await;
    if let Err(ref e) = result {
        tracing::error!("Application error: {:?}", e);
    }
    Ok(result?)
}
