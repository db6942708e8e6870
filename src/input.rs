//! Keyboard movement state
//!
//! The host feeds key presses and releases in; while any movement key is
//! held the direction is re-applied every frame, so a held key keeps the
//! player at full speed instead of letting drag run it down.

use glam::IVec2;

use crate::sim::TickInput;

/// Arrow/WASD keys currently held
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementKeys {
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl MovementKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from a key name; returns true if the key is a movement key
    pub fn set(&mut self, key: &str, down: bool) -> bool {
        match key {
            "ArrowLeft" | "a" | "A" => self.left = down,
            "ArrowRight" | "d" | "D" => self.right = down,
            "ArrowUp" | "w" | "W" => self.up = down,
            "ArrowDown" | "s" | "S" => self.down = down,
            _ => return false,
        }
        true
    }

    /// Direction in {-1,0,1}²; opposite keys cancel
    pub fn direction(&self) -> IVec2 {
        IVec2::new(
            self.right as i32 - self.left as i32,
            self.down as i32 - self.up as i32,
        )
    }

    pub fn any_held(&self) -> bool {
        self.left || self.right || self.up || self.down
    }

    /// Queue the held direction for the next tick
    pub fn apply(&self, input: &mut TickInput) {
        if self.any_held() {
            input.movement = Some(self.direction());
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_map_to_direction() {
        let mut keys = MovementKeys::new();
        assert!(keys.set("ArrowLeft", true));
        assert!(keys.set("w", true));
        assert!(!keys.set(" ", true));
        assert_eq!(keys.direction(), IVec2::new(-1, -1));

        // Opposite keys cancel but still count as held
        keys.set("D", true);
        assert_eq!(keys.direction(), IVec2::new(0, -1));

        keys.clear();
        assert!(!keys.any_held());
        assert_eq!(keys.direction(), IVec2::ZERO);
    }

    #[test]
    fn test_apply_only_while_held() {
        let mut keys = MovementKeys::new();
        let mut input = TickInput::default();
        keys.apply(&mut input);
        assert_eq!(input.movement, None);

        keys.set("ArrowRight", true);
        keys.apply(&mut input);
        assert_eq!(input.movement, Some(IVec2::new(1, 0)));

        input.movement = None;
        keys.set("ArrowRight", false);
        keys.apply(&mut input);
        assert_eq!(input.movement, None);
    }
}
