//! CLICK_OPTION: strike a labeled option until the Probe reports it checked.
//!
//! Option rows in React forms re-render aggressively: the node under the
//! cursor can be replaced between the hover check and the click, and a
//! landed click can take several hundred milliseconds to surface as
//! `checked`. The handler therefore re-verifies hover before every click,
//! tolerates transient not-found states after it, and budgets far more
//! attempts than the other handlers.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use formhand_protocols::{ActionError, Command, DomSnapshot, Point};

use super::{link_err, ActionEngine};
use crate::motion::PathProfile;

const OPTION_ATTEMPTS: u32 = 20;
/// Post-click verification retries (React re-render settling).
const VERIFY_RETRIES: u32 = 4;

impl ActionEngine {
    pub(crate) async fn click_option(&self, selector: &str, label: &str) -> Result<(), ActionError> {
        // Fast path: already checked means nothing to do at all.
        if let Ok(pre) = self.probe.query(selector, Some(label)).await {
            if pre.checked == Some(true) {
                info!("CLICK_OPTION {} \"{}\" already checked", selector, label);
                return Ok(());
            }
        }

        for attempt in 1..=OPTION_ATTEMPTS {
            if self.stopped() {
                return Err(ActionError::Stopped);
            }

            match self.try_option(selector, label, attempt).await {
                Ok(true) => {
                    info!(
                        "CLICK_OPTION {} \"{}\" verified on attempt {}",
                        selector, label, attempt
                    );
                    return Ok(());
                }
                Ok(false) => {
                    debug!("CLICK_OPTION {} \"{}\" attempt {}", selector, label, attempt)
                }
                Err(ActionError::Stopped) => return Err(ActionError::Stopped),
                Err(e) => warn!(
                    "CLICK_OPTION {} \"{}\" attempt {} failed: {}",
                    selector, label, attempt, e
                ),
            }
        }

        Err(ActionError::Unverified {
            action: "CLICK_OPTION",
            selector: selector.to_string(),
            attempts: OPTION_ATTEMPTS,
        })
    }

    async fn try_option(
        &self,
        selector: &str,
        label: &str,
        attempt: u32,
    ) -> Result<bool, ActionError> {
        let snapshot = match self.probe.query(selector, Some(label)).await {
            Ok(s) if s.found => s,
            _ => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                return Ok(false);
            }
        };

        // A previous strike may have landed late.
        if snapshot.checked == Some(true) {
            return Ok(true);
        }

        let snapshot = if snapshot.in_viewport {
            snapshot
        } else {
            let scrolled = self.scroll_into_view(selector, Some(label)).await?;
            if !scrolled.in_viewport {
                return Err(ActionError::OutOfView(selector.to_string()));
            }
            scrolled
        };

        let snapshot = if attempt >= 2 {
            match self.jiggle_and_requery(selector, label).await? {
                JiggleOutcome::Checked => return Ok(true),
                JiggleOutcome::Fresh(s) => s,
                JiggleOutcome::Lost => snapshot,
            }
        } else {
            snapshot
        };

        // The Probe's reading is authoritative; the stored cursor may have
        // drifted from Injector moves the Probe never saw.
        let reported = Point::new(snapshot.cursor_x, snapshot.cursor_y);
        let mut target = Point::new(snapshot.x, snapshot.y);
        if attempt >= 2 {
            let mut rng = rand::thread_rng();
            target.x += rng.gen_range(-5.0..=5.0);
            target.y += rng.gen_range(-5.0..=5.0);
        }
        self.move_from_snapshot(target, reported, PathProfile::NoOvershoot)
            .await?;
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Only click when the Probe confirms the right label is under the
        // cursor; a mismatch here means we would toggle a different option.
        let hover = match self.probe.query(selector, Some(label)).await {
            Ok(s) => s,
            Err(_) => return Ok(false),
        };
        let hovered = hover
            .hovered_label_text
            .as_deref()
            .unwrap_or("")
            .to_lowercase();
        if !hovered.contains(&label.to_lowercase()) {
            debug!(
                "Hover shows \"{}\", wanted \"{}\"; not clicking",
                hovered, label
            );
            return Ok(false);
        }

        self.sink.send(Command::Click).await.map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(500)).await;

        for _ in 0..VERIFY_RETRIES {
            match self.probe.query(selector, Some(label)).await {
                Ok(verify) if verify.found && verify.checked == Some(true) => return Ok(true),
                // Not found or not yet checked: give the re-render time.
                _ => tokio::time::sleep(Duration::from_millis(400)).await,
            }
        }
        Ok(false)
    }

    /// A few pixels of motion to refresh the Probe's cursor tracking, then
    /// a re-query to see whether an earlier strike registered meanwhile.
    async fn jiggle_and_requery(
        &self,
        selector: &str,
        label: &str,
    ) -> Result<JiggleOutcome, ActionError> {
        let (dx, dy) = {
            let mut rng = rand::thread_rng();
            (rng.gen_range(2..=4), rng.gen_range(2..=4))
        };
        self.sink
            .send(Command::Move { dx, dy })
            .await
            .map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(40)).await;
        self.sink
            .send(Command::Move { dx: -dx, dy: -dy })
            .await
            .map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(60)).await;

        match self.probe.query(selector, Some(label)).await {
            Ok(s) if s.checked == Some(true) => Ok(JiggleOutcome::Checked),
            Ok(s) if s.found => Ok(JiggleOutcome::Fresh(s)),
            _ => Ok(JiggleOutcome::Lost),
        }
    }
}

enum JiggleOutcome {
    Checked,
    Fresh(DomSnapshot),
    Lost,
}
