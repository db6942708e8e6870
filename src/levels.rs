//! Challenge levels
//!
//! Each level fixes a target score, obstacle speed and spawn interval, and
//! three ascending score cutoffs for the star rating.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Parameters for one challenge level (immutable for a session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    /// Score needed to complete the level
    pub target_score: u64,
    /// Pixels each obstacle moves down per tick
    pub obstacle_speed: f32,
    /// Ticks between obstacle spawns
    pub obstacle_frequency: u32,
    /// Scores needed for one, two and three stars
    pub star_thresholds: [u64; 3],
}

impl LevelConfig {
    pub fn new(
        id: u32,
        name: &str,
        target_score: u64,
        obstacle_speed: f32,
        obstacle_frequency: u32,
        star_thresholds: [u64; 3],
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            target_score,
            obstacle_speed,
            obstacle_frequency,
            star_thresholds,
        }
    }

    /// Check the parameters the game loop depends on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obstacle_frequency == 0 {
            return Err(ConfigError::ZeroObstacleFrequency { level: self.id });
        }
        if !(self.obstacle_speed > 0.0) {
            return Err(ConfigError::NonPositiveSpeed {
                level: self.id,
                speed: self.obstacle_speed,
            });
        }
        if !self.star_thresholds.is_sorted() {
            return Err(ConfigError::UnorderedStarThresholds {
                level: self.id,
                thresholds: self.star_thresholds,
            });
        }
        Ok(())
    }

    /// Stars earned by a final score (0-3)
    pub fn stars_for(&self, score: u64) -> u8 {
        self.star_thresholds.iter().filter(|&&t| score >= t).count() as u8
    }

    /// Whether a score completes the level
    pub fn is_complete(&self, score: u64) -> bool {
        score >= self.target_score
    }
}

/// Built-in level table, ordered by id starting at 1
pub fn builtin_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig::new(1, "Beginner's Path", 3000, 8.0, 60, [1800, 2400, 3000]),
        LevelConfig::new(2, "Rising Challenge", 5000, 10.0, 55, [3000, 4000, 5000]),
        LevelConfig::new(3, "Speed Test", 7000, 12.0, 50, [4200, 5600, 7000]),
        LevelConfig::new(4, "Obstacle Course", 10000, 13.0, 45, [6000, 8000, 10000]),
        LevelConfig::new(5, "Precision Run", 12000, 14.0, 40, [7200, 9600, 12000]),
        LevelConfig::new(6, "Expert Zone", 15000, 15.0, 35, [9000, 12000, 15000]),
        LevelConfig::new(7, "Master's Trial", 18000, 16.0, 30, [10800, 14400, 18000]),
        LevelConfig::new(8, "Speed Demon", 20000, 17.0, 25, [12000, 16000, 20000]),
        LevelConfig::new(9, "Ultimate Test", 25000, 18.0, 20, [15000, 20000, 25000]),
        LevelConfig::new(10, "Legend's Path", 30000, 20.0, 15, [18000, 24000, 30000]),
    ]
}

/// Number of built-in levels
pub fn level_count() -> u32 {
    builtin_levels().len() as u32
}

/// Look up a built-in level by id
pub fn level(id: u32) -> Option<LevelConfig> {
    builtin_levels().into_iter().find(|l| l.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_rating_rising_challenge() {
        let level = level(2).unwrap();
        assert_eq!(level.target_score, 5000);
        assert_eq!(level.star_thresholds, [3000, 4000, 5000]);

        assert_eq!(level.stars_for(4200), 2);
        assert!(!level.is_complete(4200));

        assert_eq!(level.stars_for(5000), 3);
        assert!(level.is_complete(5000));

        assert_eq!(level.stars_for(2999), 0);
        assert!(!level.is_complete(2999));
    }

    #[test]
    fn test_builtin_levels_are_valid() {
        let levels = builtin_levels();
        assert_eq!(levels.len(), 10);
        for (i, level) in levels.iter().enumerate() {
            assert_eq!(level.id, i as u32 + 1);
            assert!(level.validate().is_ok(), "level {} invalid", level.id);
            assert_eq!(level.star_thresholds[2], level.target_score);
        }
        // Later levels are harder
        assert!(levels.windows(2).all(|w| w[1].obstacle_speed > w[0].obstacle_speed));
        assert!(
            levels
                .windows(2)
                .all(|w| w[1].obstacle_frequency < w[0].obstacle_frequency)
        );
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let mut level = level(1).unwrap();
        level.obstacle_frequency = 0;
        assert_eq!(
            level.validate(),
            Err(ConfigError::ZeroObstacleFrequency { level: 1 })
        );

        let mut level = super::level(1).unwrap();
        level.star_thresholds = [2400, 1800, 3000];
        assert!(matches!(
            level.validate(),
            Err(ConfigError::UnorderedStarThresholds { .. })
        ));

        let mut level = super::level(1).unwrap();
        level.obstacle_speed = 0.0;
        assert!(matches!(
            level.validate(),
            Err(ConfigError::NonPositiveSpeed { .. })
        ));
    }

    #[test]
    fn test_unknown_level() {
        assert!(level(0).is_none());
        assert!(level(11).is_none());
        assert_eq!(level_count(), 10);
    }
}
