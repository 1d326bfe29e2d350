//! FormHand - Probe-verified browser form filling through a USB HID injector.
//!
//! Main entry point for the FormHand coordinator.

mod cli;
mod server;

use clap::Parser;
use tracing::warn;

use formhand_config::{Config, ConfigLoader};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    server::init_tracing();

    let cli = Cli::parse();

    let mut config = ConfigLoader::load(&cli.config).unwrap_or_else(|e| {
        warn!(
            "Failed to load config from {:?}: {}, using defaults",
            cli.config, e
        );
        Config::default()
    });

    // CLI args override config values.
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(device) = cli.device {
        config.serial.device = Some(device);
    }

    match cli.command {
        Some(Commands::ListPorts) => {
            for (name, description) in formhand_engine::link::available_devices()? {
                println!("{}\t{}", name, description);
            }
            Ok(())
        }
        None => server::run(config).await,
    }
}
