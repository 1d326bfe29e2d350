//! Iterative scroll-into-view helper.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use formhand_protocols::{ActionError, Command, DomSnapshot};

use super::{link_err, ActionEngine};

/// Scroll iterations before giving up on bringing an element into view.
const SCROLL_ITERATIONS: u32 = 12;
/// Residual scroll distance accepted as close enough to click.
const CLOSE_ENOUGH: f64 = 50.0;

impl ActionEngine {
    /// Nudge the page until the element is inside the content area, using
    /// the Probe's `scroll_delta_needed` feedback (positive scrolls down).
    ///
    /// Returns the latest snapshot. On exhaustion it still returns the last
    /// snapshot, with `in_viewport == false`; callers surface that as an
    /// out-of-view failure for the attempt.
    pub(crate) async fn scroll_into_view(
        &self,
        selector: &str,
        label_text: Option<&str>,
    ) -> Result<DomSnapshot, ActionError> {
        let mut snapshot = self.probe.query(selector, label_text).await?;

        for _ in 0..SCROLL_ITERATIONS {
            if snapshot.in_viewport {
                tokio::time::sleep(Duration::from_millis(150)).await;
                return Ok(snapshot);
            }

            let delta = snapshot.scroll_delta_needed;
            if delta.abs() < CLOSE_ENOUGH {
                // Just off the centering distance; near enough to act on.
                debug!("Scroll residual {:.0}px accepted as in view", delta);
                snapshot.in_viewport = true;
                tokio::time::sleep(Duration::from_millis(150)).await;
                return Ok(snapshot);
            }

            let units = delta.signum() as i32 * rand::thread_rng().gen_range(4..=8);
            self.sink
                .send(Command::Scroll { units })
                .await
                .map_err(link_err)?;

            let pause = rand::thread_rng().gen_range(80..=120);
            tokio::time::sleep(Duration::from_millis(pause)).await;

            snapshot = self.probe.query(selector, label_text).await?;
        }

        debug!("Scroll-into-view exhausted for {}", selector);
        Ok(snapshot)
    }
}
