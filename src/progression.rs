use std::collections::HashMap;

use log::info;

use crate::outcome::Outcome;

/// Number of levels offered by the level selector
pub const LEVEL_COUNT: u32 = 12;

/// Receives finished sessions
pub trait LevelProgression {
    fn record(&mut self, outcome: &Outcome);
}

/// Unlock state and best star ratings for the current run of the game.
/// Kept in memory only.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    unlocked: u32,
    best_stars: HashMap<u32, u8>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            unlocked: 1,
            best_stars: HashMap::new(),
        }
    }
}

impl Progression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unlocked(&self) -> u32 {
        self.unlocked
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        (1..=self.unlocked).contains(&level)
    }

    /// Best rating so far, 0 for levels never finished
    pub fn stars_for(&self, level: u32) -> u8 {
        self.best_stars.get(&level).copied().unwrap_or(0)
    }

    pub fn total_stars(&self) -> u32 {
        self.best_stars.values().map(|s| *s as u32).sum()
    }

    /// Open every level up to `level` (capped at the last one)
    pub fn unlock_through(&mut self, level: u32) {
        self.unlocked = self.unlocked.max(level.min(LEVEL_COUNT));
    }

    /// The level after `level`, or `None` past the last one
    pub fn next_level(&self, level: u32) -> Option<u32> {
        let next = level.saturating_add(1);
        (next <= LEVEL_COUNT).then_some(next)
    }
}

impl LevelProgression for Progression {
    fn record(&mut self, outcome: &Outcome) {
        let best = self.best_stars.entry(outcome.level).or_insert(0);
        *best = (*best).max(outcome.stars);

        if let Some(next) = self.next_level(outcome.level) {
            if next > self.unlocked {
                info!("level {} unlocked", next);
                self.unlocked = next;
            }
        }
    }
}
