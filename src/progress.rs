//! Level progress and endless high score
//!
//! Persisted to LocalStorage. Consumes final scores reported by the game
//! loop; never consulted while a session is ticking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::levels::LevelConfig;
use crate::sim::VariantKind;

/// Endless score that unlocks the cat character
pub const CAT_UNLOCK_SCORE: u64 = 10_000;

/// Progress on a single level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Best star rating achieved
    pub stars: u8,
    /// Best score achieved
    pub high_score: u64,
    pub unlocked: bool,
    pub completed: bool,
}

/// Result of recording a challenge run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelOutcome {
    /// Stars earned by this run alone
    pub stars: u8,
    pub completed: bool,
    /// Next level id if this run unlocked it
    pub unlocked_next: Option<u32>,
    pub new_high_score: bool,
}

/// Everything the player has achieved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Per-level progress keyed by level id
    pub levels: BTreeMap<u32, LevelProgress>,
    #[serde(default)]
    pub endless_high_score: u64,
    #[serde(default = "default_unlocked")]
    pub unlocked_variants: Vec<VariantKind>,
}

fn default_unlocked() -> Vec<VariantKind> {
    vec![VariantKind::Ball]
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "zip_dash_progress";

    /// Fresh progress: level 1 unlocked, ball character only
    pub fn new() -> Self {
        let mut levels = BTreeMap::new();
        levels.insert(
            1,
            LevelProgress {
                unlocked: true,
                ..Default::default()
            },
        );
        Self {
            levels,
            endless_high_score: 0,
            unlocked_variants: default_unlocked(),
        }
    }

    pub fn level(&self, id: u32) -> Option<&LevelProgress> {
        self.levels.get(&id)
    }

    pub fn is_unlocked(&self, id: u32) -> bool {
        self.levels.get(&id).is_some_and(|p| p.unlocked)
    }

    /// Total stars across all levels
    pub fn total_stars(&self) -> u32 {
        self.levels.values().map(|p| p.stars as u32).sum()
    }

    /// Record the final score of a challenge run
    ///
    /// Stars and high score only ever improve; completion is sticky. Meeting
    /// the target unlocks the next level when one exists.
    pub fn record_level(
        &mut self,
        level: &LevelConfig,
        score: u64,
        level_count: u32,
    ) -> LevelOutcome {
        let stars = level.stars_for(score);
        let completed = level.is_complete(score);

        let entry = self.levels.entry(level.id).or_default();
        let new_high_score = score > entry.high_score;
        entry.stars = entry.stars.max(stars);
        entry.high_score = entry.high_score.max(score);
        entry.completed |= completed;

        let next_id = level.id + 1;
        let unlocked_next = if completed && next_id <= level_count {
            let next = self.levels.entry(next_id).or_default();
            let newly = !next.unlocked;
            next.unlocked = true;
            newly.then_some(next_id)
        } else {
            None
        };

        log::info!(
            "Level {} run: score={} stars={} completed={}",
            level.id,
            score,
            stars,
            completed
        );

        LevelOutcome {
            stars,
            completed,
            unlocked_next,
            new_high_score,
        }
    }

    /// Record the final score of an endless run, returns true on a new best
    pub fn record_endless(&mut self, score: u64) -> bool {
        if score <= self.endless_high_score {
            return false;
        }
        self.endless_high_score = score;
        if score >= CAT_UNLOCK_SCORE {
            self.unlock_variant(VariantKind::Cat);
        }
        true
    }

    /// The ball is always playable; other characters once unlocked
    pub fn is_variant_unlocked(&self, variant: VariantKind) -> bool {
        variant == VariantKind::Ball || self.unlocked_variants.contains(&variant)
    }

    /// `wanted` if it is unlocked, otherwise the ball
    pub fn playable_variant(&self, wanted: VariantKind) -> VariantKind {
        if self.is_variant_unlocked(wanted) {
            wanted
        } else {
            VariantKind::Ball
        }
    }

    /// Next unlocked character after `current`, wrapping around
    pub fn next_variant(&self, current: VariantKind) -> VariantKind {
        let all = VariantKind::ALL;
        let start = all.iter().position(|v| *v == current).unwrap_or(0);
        (1..=all.len())
            .map(|step| all[(start + step) % all.len()])
            .find(|v| self.is_variant_unlocked(*v))
            .unwrap_or(VariantKind::Ball)
    }

    pub fn unlock_variant(&mut self, variant: VariantKind) {
        if !self.unlocked_variants.contains(&variant) {
            log::info!("Unlocked character: {:?}", variant);
            self.unlocked_variants.push(variant);
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load progress from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(progress) => {
                        log::info!("Loaded progress ({} levels)", progress.levels.len());
                        return progress;
                    }
                    Err(e) => log::warn!("Ignoring stored progress: {}", e),
                }
            }
        }

        log::info!("No progress found, starting fresh");
        Self::new()
    }

    /// Save progress to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), StorageError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)?;
        let json = self.to_json()?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|_| StorageError::Unavailable)?;
        log::info!("Progress saved");
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
