//! Fixed-step driver
//!
//! Turns variable frame times into whole ticks of `TICK_MS`. Leftover time
//! carries to the next frame; long stalls are capped so a hidden tab does
//! not replay seconds of game at once.

use super::physics::PhysicsWorld;
use super::state::{GameEvent, Session};
use super::tick::{TickInput, tick};
use crate::consts::{MAX_SUBSTEPS, TICK_MS};

/// Longest frame accepted in one advance: exactly the substep budget
const MAX_FRAME_MS: f64 = MAX_SUBSTEPS as f64 * TICK_MS;

#[derive(Debug, Clone)]
pub struct Runner {
    accumulator_ms: f64,
    interval_ms: f64,
    max_substeps: u32,
    active: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            accumulator_ms: 0.0,
            interval_ms: TICK_MS,
            max_substeps: MAX_SUBSTEPS,
            active: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop driving ticks; later frames do nothing
    pub fn stop(&mut self) {
        self.active = false;
        self.accumulator_ms = 0.0;
    }

    /// Run as many ticks as `frame_ms` covers. One-shot inputs are cleared
    /// after the first tick that sees them.
    pub fn advance<W: PhysicsWorld>(
        &mut self,
        session: &mut Session<W>,
        frame_ms: f64,
        now_ms: f64,
        input: &mut TickInput,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.active {
            return events;
        }
        self.accumulator_ms += frame_ms.clamp(0.0, MAX_FRAME_MS);

        let mut substeps = 0;
        while self.accumulator_ms >= self.interval_ms && substeps < self.max_substeps {
            events.extend(tick(session, input, now_ms));
            self.accumulator_ms -= self.interval_ms;
            substeps += 1;

            input.movement = None;
            input.dash = false;
            input.toggle_pause = false;
        }
        events
    }
}
