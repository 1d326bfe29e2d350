//! The verify-before-proceed action engine.
//!
//! Each handler follows the same discipline: query the Probe, act through
//! the Injector, re-query, and only report success once the intended DOM
//! change is observed. Retry budgets are bounded per handler; exhausting one
//! halts the sequencer so no later action runs on unverified state.

mod click;
mod fill;
mod option;
mod scroll;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use formhand_config::MotionConfig;
use formhand_protocols::{Action, ActionError, Command, Point};

use crate::link::{CommandSink, LinkError};
use crate::motion::{MotionEngine, MotionError};
use crate::probe::ProbeTransport;
use crate::state::StateStore;

/// Sequencer over a command list, plus the per-action handlers.
pub struct ActionEngine {
    store: Arc<StateStore>,
    probe: Arc<dyn ProbeTransport>,
    sink: Arc<dyn CommandSink>,
    motion: MotionEngine,
    stop: Arc<AtomicBool>,
}

impl ActionEngine {
    pub fn new(
        store: Arc<StateStore>,
        probe: Arc<dyn ProbeTransport>,
        sink: Arc<dyn CommandSink>,
        motion_config: &MotionConfig,
        stop: Arc<AtomicBool>,
    ) -> Arc<Self> {
        let motion = MotionEngine::new(store.clone(), sink.clone(), motion_config);
        Arc::new(Self {
            store,
            probe,
            sink,
            motion,
            stop,
        })
    }

    /// Dispatch the parked command list into a background sequencer run.
    ///
    /// Returns the number of actions dispatched. Rejected when a run is
    /// already in progress or nothing is parked; a rejected dispatch leaves
    /// any running sequencer untouched.
    pub fn start(self: &Arc<Self>) -> Result<usize, ActionError> {
        if !self.store.try_begin_automation() {
            return Err(ActionError::AlreadyRunning);
        }
        let Some(actions) = self.store.take_parked_commands() else {
            self.store.end_automation();
            return Err(ActionError::NothingParked);
        };

        let count = actions.len();
        info!("Dispatching {} actions", count);
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.run_list(&actions).await;
            engine.store.end_automation();
            match result {
                Ok(()) => info!("Command list complete"),
                Err(e) => error!("Sequencer halted: {}", e),
            }
        });
        Ok(count)
    }

    /// Run a list to completion or first hard failure. The caller owns the
    /// automating flag.
    pub async fn run_list(&self, actions: &[Action]) -> Result<(), ActionError> {
        for (idx, action) in actions.iter().enumerate() {
            if self.stop.load(Ordering::SeqCst) {
                return Err(ActionError::Stopped);
            }
            info!("Action {}/{}: {:?}", idx + 1, actions.len(), action);

            match action {
                Action::Delay { ms } => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                }
                Action::FillField { selector, text } => {
                    self.fill_field(selector, text).await?;
                }
                Action::ClickSelector { selector } => {
                    self.click_selector(selector).await?;
                }
                Action::ClickOption { selector, label } => {
                    self.click_option(selector, label).await?;
                }
                Action::Raw(line) => {
                    let command = Command::Raw(line.clone());
                    if command.is_blocked() {
                        warn!("Skipping blocked raw command: {}", line);
                    } else {
                        self.sink.send(command).await.map_err(link_err)?;
                    }
                }
            }

            if idx + 1 < actions.len() {
                let pause = rand::thread_rng().gen_range(100..=300);
                tokio::time::sleep(Duration::from_millis(pause)).await;
            }
        }
        Ok(())
    }

    pub fn automating(&self) -> bool {
        self.store.automating()
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Move with the Probe's snapshot cursor as the authoritative start.
    async fn move_from_snapshot(
        &self,
        target: Point,
        reported_cursor: Point,
        profile: crate::motion::PathProfile,
    ) -> Result<(), ActionError> {
        self.store.set_cursor(reported_cursor);
        self.motion
            .move_to(target, Some(reported_cursor), profile)
            .await
            .map_err(motion_err)
    }
}

pub(crate) fn link_err(e: LinkError) -> ActionError {
    match e {
        LinkError::Stopped => ActionError::Stopped,
        other => ActionError::Link(other.to_string()),
    }
}

pub(crate) fn motion_err(e: MotionError) -> ActionError {
    match e {
        MotionError::NoViewport => ActionError::NoViewport,
        MotionError::Link(LinkError::Stopped) => ActionError::Stopped,
        MotionError::Link(other) => ActionError::Link(other.to_string()),
    }
}
