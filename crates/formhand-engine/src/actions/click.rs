//! CLICK_SELECTOR: click an element, verifying checked-state changes.

use std::time::Duration;

use tracing::{info, warn};

use formhand_protocols::{ActionError, Command, Point};

use super::{link_err, ActionEngine};
use crate::motion::PathProfile;

const CLICK_ATTEMPTS: u32 = 4;

impl ActionEngine {
    pub(crate) async fn click_selector(&self, selector: &str) -> Result<(), ActionError> {
        for attempt in 1..=CLICK_ATTEMPTS {
            if self.stopped() {
                return Err(ActionError::Stopped);
            }

            match self.try_click(selector).await {
                Ok(true) => {
                    info!("CLICK_SELECTOR {} verified on attempt {}", selector, attempt);
                    return Ok(());
                }
                Ok(false) => warn!("CLICK_SELECTOR {} attempt {} unverified", selector, attempt),
                Err(ActionError::Stopped) => return Err(ActionError::Stopped),
                Err(e) => warn!("CLICK_SELECTOR {} attempt {} failed: {}", selector, attempt, e),
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        Err(ActionError::Unverified {
            action: "CLICK_SELECTOR",
            selector: selector.to_string(),
            attempts: CLICK_ATTEMPTS,
        })
    }

    async fn try_click(&self, selector: &str) -> Result<bool, ActionError> {
        let snapshot = self.probe.query(selector, None).await?;
        if !snapshot.found {
            return Err(ActionError::ElementNotFound(selector.to_string()));
        }
        let prior_checked = snapshot.checked;

        let snapshot = if snapshot.in_viewport {
            snapshot
        } else {
            let scrolled = self.scroll_into_view(selector, None).await?;
            if !scrolled.in_viewport {
                return Err(ActionError::OutOfView(selector.to_string()));
            }
            scrolled
        };

        self.move_from_snapshot(
            Point::new(snapshot.x, snapshot.y),
            Point::new(snapshot.cursor_x, snapshot.cursor_y),
            PathProfile::Natural,
        )
        .await?;
        self.sink.send(Command::Click).await.map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(200)).await;

        match prior_checked {
            // Checkable element: the click must be observed as a toggle.
            Some(prior) => {
                let verify = self.probe.query(selector, None).await?;
                Ok(verify.checked.is_some_and(|now| now != prior))
            }
            // Nothing observable to verify against; a completed move and
            // click count as success.
            None => Ok(true),
        }
    }
}
