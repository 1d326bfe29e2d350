//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub motion: MotionConfig,
}

/// HTTP control plane bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3004
}

/// Injector serial device selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyACM0`). When absent, ports are scanned for
    /// one whose USB manufacturer string contains `manufacturer_hint`.
    #[serde(default)]
    pub device: Option<String>,

    #[serde(default = "default_baud")]
    pub baud: u32,

    #[serde(default = "default_manufacturer_hint")]
    pub manufacturer_hint: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: None,
            baud: default_baud(),
            manufacturer_hint: default_manufacturer_hint(),
        }
    }
}

fn default_baud() -> u32 {
    115_200
}

fn default_manufacturer_hint() -> String {
    "Raspberry Pi".to_string()
}

/// Motion engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Safety margin subtracted from every viewport edge before clamping.
    #[serde(default = "default_viewport_margin")]
    pub viewport_margin: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            viewport_margin: default_viewport_margin(),
        }
    }
}

fn default_viewport_margin() -> f64 {
    20.0
}
