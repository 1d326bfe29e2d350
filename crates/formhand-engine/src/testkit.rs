//! Shared fakes for engine tests: a command sink that records instead of
//! writing to a device, and a probe that replays scripted snapshots.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use formhand_protocols::{Command, DomSnapshot, ProbeError, ScanResult};

use crate::link::{CommandSink, LinkError};
use crate::probe::ProbeTransport;

/// Records every command in enqueue order.
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<Command>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commands(&self) -> Vec<Command> {
        self.sent.lock().clone()
    }

    pub fn count_moves(&self) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|c| matches!(c, Command::Move { .. }))
            .count()
    }

    pub fn count_clicks(&self) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|c| matches!(c, Command::Click))
            .count()
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn send(&self, command: Command) -> Result<(), LinkError> {
        if command.is_blocked() {
            return Err(LinkError::Blocked(command.wire()));
        }
        self.sent.lock().push(command);
        Ok(())
    }
}

/// Replays queued snapshots in order; repeats the last one when the script
/// runs dry. An empty script yields probe timeouts.
pub struct ScriptedProbe {
    snapshots: Mutex<VecDeque<DomSnapshot>>,
    scans: Mutex<VecDeque<ScanResult>>,
    pub queries: Mutex<Vec<(String, Option<String>)>>,
}

impl ScriptedProbe {
    pub fn new(script: Vec<DomSnapshot>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(script.into()),
            scans: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn push_scan(&self, result: ScanResult) {
        self.scans.lock().push_back(result);
    }
}

#[async_trait]
impl ProbeTransport for ScriptedProbe {
    async fn query(
        &self,
        selector: &str,
        label_text: Option<&str>,
    ) -> Result<DomSnapshot, ProbeError> {
        self.queries
            .lock()
            .push((selector.to_string(), label_text.map(|s| s.to_string())));

        let mut snapshots = self.snapshots.lock();
        if snapshots.len() > 1 {
            Ok(snapshots.pop_front().unwrap())
        } else if let Some(last) = snapshots.front() {
            Ok(last.clone())
        } else {
            Err(ProbeError::QueryTimeout {
                request_id: 0,
                seconds: 5,
            })
        }
    }

    async fn scan(&self) -> Result<ScanResult, ProbeError> {
        self.scans.lock().pop_front().ok_or(ProbeError::ScanTimeout {
            request_id: 0,
            seconds: 10,
        })
    }
}
