//! Ordered, rate-limited write channel to the Injector.
//!
//! The serial port is opened once at startup and held for process lifetime.
//! Commands flow through a FIFO with a single consumer that writes one CR LF
//! line at a time and paces with a fixed gap; the firmware is free-running
//! and is never awaited for acknowledgement. A separate reader task logs
//! inbound diagnostic lines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio_serial::{SerialPortBuilderExt, SerialPortType};
use tracing::{debug, info, warn};

use formhand_config::SerialConfig;
use formhand_protocols::Command;

/// Gap between consecutive command writes. The Injector applies each line
/// immediately; this is the only back-pressure in the pipeline.
const COMMAND_GAP: Duration = Duration::from_millis(50);

/// Injector link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Failed to open serial device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("Serial port enumeration failed: {0}")]
    Enumerate(#[source] tokio_serial::Error),

    #[error("No serial device with manufacturer matching \"{0}\"")]
    DeviceNotFound(String),

    #[error("Blocked command: {0}")]
    Blocked(String),

    #[error("Command queue closed")]
    QueueClosed,

    #[error("Emergency stop engaged")]
    Stopped,
}

/// Anything that accepts Injector commands in order.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Enqueue a command and wait until its bytes (and pacing gap) are done.
    async fn send(&self, command: Command) -> Result<(), LinkError>;
}

struct Queued {
    command: Command,
    done: oneshot::Sender<()>,
}

/// The serial command pipeline.
pub struct InjectorLink {
    tx: mpsc::UnboundedSender<Queued>,
    stop: Arc<AtomicBool>,
}

impl InjectorLink {
    /// Open the configured serial device (auto-detecting when no path is
    /// configured) and start the consumer and reader tasks.
    pub fn open(config: &SerialConfig, stop: Arc<AtomicBool>) -> Result<Self, LinkError> {
        let path = match &config.device {
            Some(path) => path.clone(),
            None => detect_device(&config.manufacturer_hint)?,
        };

        let stream = tokio_serial::new(path.as_str(), config.baud)
            .open_native_async()
            .map_err(|source| LinkError::Open {
                path: path.clone(),
                source,
            })?;
        info!("Injector link open: {} @ {} baud", path, config.baud);

        let (read_half, write_half) = tokio::io::split(stream);
        spawn_reader(read_half);
        Ok(Self::start(write_half, stop))
    }

    /// Start the pipeline over an arbitrary writer. Used by `open` and by
    /// tests running against an in-memory duplex.
    pub fn start<W>(writer: W, stop: Arc<AtomicBool>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(consume(writer, rx, stop.clone()));
        Self { tx, stop }
    }
}

#[async_trait]
impl CommandSink for InjectorLink {
    async fn send(&self, command: Command) -> Result<(), LinkError> {
        if self.stop.load(Ordering::SeqCst) {
            return Err(LinkError::Stopped);
        }
        if command.is_blocked() {
            warn!("Refusing blocked command: {}", command);
            return Err(LinkError::Blocked(command.wire()));
        }

        let (done, done_rx) = oneshot::channel();
        self.tx
            .send(Queued { command, done })
            .map_err(|_| LinkError::QueueClosed)?;
        done_rx.await.map_err(|_| LinkError::QueueClosed)
    }
}

/// Single consumer: pops in FIFO order, writes one full line, paces, signals.
async fn consume<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Queued>, stop: Arc<AtomicBool>)
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    while let Some(queued) = rx.recv().await {
        // Drain without writing once the stop flag is up. Never interrupts
        // a write mid-line: the flag is only checked between commands.
        if stop.load(Ordering::SeqCst) {
            let _ = queued.done.send(());
            continue;
        }

        let line = format!("{}\r\n", queued.command.wire());
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!("Injector write failed: {}", e);
            // The port is gone; signal and keep draining so senders unblock.
            let _ = queued.done.send(());
            continue;
        }
        if let Err(e) = writer.flush().await {
            warn!("Injector flush failed: {}", e);
        }

        // Motion deltas are already paced by the path walker; holding them
        // another 50 ms would turn a 40-point path into two seconds.
        if !matches!(queued.command, Command::Move { .. }) {
            tokio::time::sleep(COMMAND_GAP).await;
        }
        let _ = queued.done.send(());
    }
    debug!("Injector consumer exited");
}

/// Log inbound firmware lines. Diagnostic only; never awaited.
fn spawn_reader<R>(reader: R)
where
    R: tokio::io::AsyncRead + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => debug!("injector: {}", line.trim_end()),
                Ok(None) => break,
                Err(e) => {
                    warn!("Injector read failed: {}", e);
                    break;
                }
            }
        }
        debug!("Injector reader exited");
    });
}

/// Enumerate serial ports with a human-readable description of each.
pub fn available_devices() -> Result<Vec<(String, String)>, LinkError> {
    let ports = tokio_serial::available_ports().map_err(LinkError::Enumerate)?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match &p.port_type {
                SerialPortType::UsbPort(info) => {
                    info.manufacturer.clone().unwrap_or_else(|| "USB".to_string())
                }
                other => format!("{:?}", other),
            };
            (p.port_name, description)
        })
        .collect())
}

/// Scan USB serial ports for one whose manufacturer string contains `hint`.
pub fn detect_device(hint: &str) -> Result<String, LinkError> {
    let ports = tokio_serial::available_ports().map_err(LinkError::Enumerate)?;
    for port in ports {
        if let SerialPortType::UsbPort(info) = &port.port_type {
            let manufacturer = info.manufacturer.as_deref().unwrap_or("");
            if manufacturer.contains(hint) {
                info!(
                    "Auto-detected Injector: {} ({})",
                    port.port_name, manufacturer
                );
                return Ok(port.port_name);
            }
            debug!("Skipping {} ({})", port.port_name, manufacturer);
        }
    }
    Err(LinkError::DeviceNotFound(hint.to_string()))
}

#[cfg(test)]
#[path = "link_tests.rs"]
mod tests;
