//! Absolute-target to relative-delta path generation.
//!
//! Targets arrive in absolute screen coordinates; the Injector only
//! understands relative deltas. The planner clamps everything to the
//! last-known viewport (minus a safety margin), samples a lightly curved
//! path, emits integer deltas with jittered pacing, then runs a single
//! correction pass against the Probe's live cursor reading.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use formhand_config::MotionConfig;
use formhand_protocols::{Command, Point, ViewportBounds};

use crate::link::{CommandSink, LinkError};
use crate::state::StateStore;

/// Below this distance no motion is emitted at all.
const MIN_MOVE_DISTANCE: f64 = 3.0;
/// Residual error beyond which the correction pass emits one final delta.
const CORRECTION_THRESHOLD: f64 = 10.0;
/// How long to wait for viewport bounds before refusing to move.
const VIEWPORT_WAIT: Duration = Duration::from_secs(2);
/// Settle time after the last delta for the Probe's mousemove stream.
const SETTLE: Duration = Duration::from_millis(60);

/// Motion planning errors.
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("No viewport bounds available")]
    NoViewport,

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Path aesthetic for one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProfile {
    /// Default curved path with a visible bow.
    Natural,
    /// Flattened bow for precision strikes on small option targets.
    NoOvershoot,
}

/// Converts absolute targets into `MOVE,dx,dy` streams.
pub struct MotionEngine {
    store: Arc<StateStore>,
    sink: Arc<dyn CommandSink>,
    margin: f64,
}

impl MotionEngine {
    pub fn new(store: Arc<StateStore>, sink: Arc<dyn CommandSink>, config: &MotionConfig) -> Self {
        Self {
            store,
            sink,
            margin: config.viewport_margin,
        }
    }

    /// Move to `target`, clamped to the viewport.
    ///
    /// `start` overrides the stored cursor as the path origin when the
    /// caller has a fresher reading (the Probe's snapshot cursor is
    /// authoritative during actions). Blocks up to 2 s for viewport bounds;
    /// refuses when none arrive. Post-condition: the stored cursor equals
    /// `target` whether or not the Probe confirms, so actions can chain.
    pub async fn move_to(
        &self,
        target: Point,
        start: Option<Point>,
        profile: PathProfile,
    ) -> Result<(), MotionError> {
        let bounds = self
            .wait_for_viewport()
            .await
            .ok_or(MotionError::NoViewport)?;
        self.drive(target, start, profile, Some(bounds)).await
    }

    /// Degraded-mode move for the debug path: uses bounds when known,
    /// otherwise trusts the caller's coordinates unclamped.
    pub async fn move_to_unclamped(
        &self,
        target: Point,
        start: Option<Point>,
    ) -> Result<(), MotionError> {
        let bounds = self.store.viewport();
        self.drive(target, start, PathProfile::Natural, bounds).await
    }

    async fn wait_for_viewport(&self) -> Option<ViewportBounds> {
        let deadline = tokio::time::Instant::now() + VIEWPORT_WAIT;
        loop {
            if let Some(bounds) = self.store.viewport() {
                return Some(bounds);
            }
            if tokio::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn drive(
        &self,
        target: Point,
        start: Option<Point>,
        profile: PathProfile,
        bounds: Option<ViewportBounds>,
    ) -> Result<(), MotionError> {
        let clamp = |p: Point| bounds.map_or(p, |b| b.clamp(p, self.margin));

        // The start may be stale; clamp it to the same rectangle as the
        // target so the first delta cannot leave the viewport.
        let start = clamp(start.unwrap_or_else(|| self.store.cursor()));
        let target = clamp(target);

        let distance = start.distance_to(target);
        if distance < MIN_MOVE_DISTANCE {
            self.store.set_cursor(target);
            return Ok(());
        }
        debug!(
            "Moving ({:.0},{:.0}) -> ({:.0},{:.0}), {:.0}px",
            start.x, start.y, target.x, target.y, distance
        );

        let before = self.store.cursor();
        let path = {
            let mut rng = rand::thread_rng();
            curve_path(start, target, profile, &mut rng)
        };

        let mut last = (start.x.round() as i32, start.y.round() as i32);
        for point in path {
            let point = clamp(point);
            let xi = point.x.round() as i32;
            let yi = point.y.round() as i32;
            let dx = xi - last.0;
            let dy = yi - last.1;
            if dx == 0 && dy == 0 {
                continue;
            }
            self.sink.send(Command::Move { dx, dy }).await?;
            last = (xi, yi);

            let pause = rand::thread_rng().gen_range(4..=14);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }

        // Let the Probe's mousemove stream catch up before correcting.
        tokio::time::sleep(SETTLE).await;

        // Correct only against fresh feedback: an unchanged store reading
        // means the Probe reported nothing during the move, and a delta
        // computed from it would replay the whole displacement.
        let current = self.store.cursor();
        if current != before && current.distance_to(target) > CORRECTION_THRESHOLD {
            let dx = target.x.round() as i32 - current.x.round() as i32;
            let dy = target.y.round() as i32 - current.y.round() as i32;
            trace!("Correction pass: ({},{})", dx, dy);
            if dx != 0 || dy != 0 {
                self.sink.send(Command::Move { dx, dy }).await?;
            }
        }

        self.store.set_cursor(target);
        Ok(())
    }
}

/// Hops at or under this distance go direct, as a single delta.
const SHORT_HOP: f64 = 25.0;

/// Sample a quadratic curve from `start` to `target` with a small
/// perpendicular bow on a random side. The sample count is linear in
/// distance and bounded, so one invocation can never flood the Injector.
fn curve_path<R: Rng>(
    start: Point,
    target: Point,
    profile: PathProfile,
    rng: &mut R,
) -> Vec<Point> {
    let distance = start.distance_to(target);
    if distance <= SHORT_HOP {
        return vec![target];
    }
    let steps = ((distance / 12.0).ceil() as usize).clamp(3, 96);

    let (bow_scale, bow_cap) = match profile {
        PathProfile::Natural => (0.03, 20.0),
        PathProfile::NoOvershoot => (0.015, 8.0),
    };
    let peak = (distance * bow_scale).min(bow_cap);
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };

    // Unit perpendicular to the chord.
    let ux = (target.x - start.x) / distance;
    let uy = (target.y - start.y) / distance;
    let (px, py) = (-uy, ux);

    let control = Point::new(
        (start.x + target.x) / 2.0 + px * peak * side,
        (start.y + target.y) / 2.0 + py * peak * side,
    );

    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let mt = 1.0 - t;
            Point::new(
                mt * mt * start.x + 2.0 * mt * t * control.x + t * t * target.x,
                mt * mt * start.y + 2.0 * mt * t * control.y + t * t * target.y,
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "motion_tests.rs"]
mod tests;
