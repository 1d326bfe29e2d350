//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FormHand - Probe-verified browser form filling through a USB HID injector.
#[derive(Parser, Debug)]
#[command(name = "formhand", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "formhand.toml")]
    pub config: PathBuf,

    /// Override the control plane port.
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the Injector serial device path.
    #[arg(long, env = "FORMHAND_SERIAL_DEVICE")]
    pub device: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List candidate serial devices and exit.
    ListPorts,
}
