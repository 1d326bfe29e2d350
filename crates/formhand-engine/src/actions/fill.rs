//! FILL_FIELD: focus a text input, clear it, and type with verification.

use std::time::Duration;

use tracing::{info, warn};

use formhand_protocols::{ActionError, Command, Point};

use super::{link_err, ActionEngine};
use crate::motion::PathProfile;
use crate::typing::type_text;

const FILL_ATTEMPTS: u32 = 4;
/// How much of either string must prefix the other for a verify to pass.
const VERIFY_PREFIX_LEN: usize = 20;

impl ActionEngine {
    pub(crate) async fn fill_field(&self, selector: &str, text: &str) -> Result<(), ActionError> {
        for attempt in 1..=FILL_ATTEMPTS {
            if self.stopped() {
                return Err(ActionError::Stopped);
            }

            match self.try_fill(selector, text).await {
                Ok(true) => {
                    info!("FILL_FIELD {} verified on attempt {}", selector, attempt);
                    return Ok(());
                }
                Ok(false) => warn!("FILL_FIELD {} attempt {} unverified", selector, attempt),
                Err(ActionError::Stopped) => return Err(ActionError::Stopped),
                Err(e) => warn!("FILL_FIELD {} attempt {} failed: {}", selector, attempt, e),
            }
            tokio::time::sleep(Duration::from_millis(300)).await;
        }

        Err(ActionError::Unverified {
            action: "FILL_FIELD",
            selector: selector.to_string(),
            attempts: FILL_ATTEMPTS,
        })
    }

    async fn try_fill(&self, selector: &str, text: &str) -> Result<bool, ActionError> {
        let snapshot = self.probe.query(selector, None).await?;
        if !snapshot.found {
            return Err(ActionError::ElementNotFound(selector.to_string()));
        }

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
        tokio::time::sleep(Duration::from_millis(250)).await;

        let mut focused = self.probe.query(selector, None).await?;
        if !focused.focused {
            // One re-strike before burning the attempt.
            self.move_from_snapshot(
                Point::new(focused.x, focused.y),
                Point::new(focused.cursor_x, focused.cursor_y),
                PathProfile::Natural,
            )
            .await?;
            self.sink.send(Command::Click).await.map_err(link_err)?;
            tokio::time::sleep(Duration::from_millis(250)).await;

            focused = self.probe.query(selector, None).await?;
            if !focused.focused {
                return Ok(false);
            }
        }

        // Select-all so typing replaces whatever is in the field.
        self.sink
            .send(Command::combo("ctrl+a"))
            .await
            .map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(120)).await;

        type_text(self.sink.as_ref(), text).await.map_err(link_err)?;
        tokio::time::sleep(Duration::from_millis(200)).await;

        let verify = self.probe.query(selector, None).await?;
        Ok(values_match(&verify.value, text))
    }
}

/// Case-folded, trimmed comparison: success when either side begins with
/// the first 20 characters of the other.
fn values_match(actual: &str, target: &str) -> bool {
    let actual = actual.trim().to_lowercase();
    let target = target.trim().to_lowercase();
    if actual.is_empty() {
        return target.is_empty();
    }

    let actual_prefix: String = actual.chars().take(VERIFY_PREFIX_LEN).collect();
    let target_prefix: String = target.chars().take(VERIFY_PREFIX_LEN).collect();
    actual.starts_with(&target_prefix) || target.starts_with(&actual_prefix)
}
