//! Fire-once timers
//!
//! Wall-clock effects (dash window expiry, particle fade, dash burst, hit
//! feedback) are queued here and drained at the start of each tick in due
//! order, so they never interleave with the tick's own ordering. Actions
//! carry body handles; whoever applies them must check the body still
//! exists.

use super::physics::BodyHandle;

/// Deferred effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Return the dashing player to the normal collision category
    EndDashImmunity { player: BodyHandle },
    /// Remove a faded particle
    FadeParticle { particle: BodyHandle },
    /// Emit one particle of the dash ring around the player
    DashBurst { player: BodyHandle, index: u32 },
    /// Hit feedback finished: report game over
    FinishHitFeedback,
}

#[derive(Debug, Clone)]
struct Timer {
    due_ms: f64,
    seq: u64,
    action: TimerAction,
}

/// Pending timers, fired in (due time, scheduling order)
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: f64, action: TimerAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due_ms,
            seq,
            action,
        });
    }

    /// Remove and return every action due at or before `now_ms`
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<TimerAction> {
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.due_ms <= now_ms);
        self.timers = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|t| t.action).collect()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_due_in_order() {
        let mut q = TimerQueue::new();
        q.schedule(300.0, TimerAction::FinishHitFeedback);
        q.schedule(100.0, TimerAction::FinishHitFeedback);
        q.schedule(
            100.0,
            TimerAction::FadeParticle {
                particle: dummy_handle(),
            },
        );

        assert!(q.drain_due(50.0).is_empty());

        let due = q.drain_due(100.0);
        assert_eq!(due.len(), 2);
        // Same due time keeps scheduling order
        assert_eq!(due[0], TimerAction::FinishHitFeedback);
        assert!(matches!(due[1], TimerAction::FadeParticle { .. }));
        assert_eq!(q.len(), 1);

        assert_eq!(q.drain_due(300.0), vec![TimerAction::FinishHitFeedback]);
        q.schedule(400.0, TimerAction::FinishHitFeedback);
        q.clear();
        assert!(q.is_empty());
    }

    fn dummy_handle() -> BodyHandle {
        use super::super::physics::{ArcadeWorld, BodyDesc, BodyLabel, PhysicsWorld};
        let mut world = ArcadeWorld::new();
        world.add_body(BodyDesc::new(BodyLabel::Particle, glam::Vec2::ZERO, vec![]))
    }
}
