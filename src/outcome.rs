pub const POINTS_PER_REPAIR: u32 = 100;

/// Result of a finished session, handed to level progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub level: u32,
    pub score: u32,
    pub stars: u8,
    pub percentage: f64,
}

impl Outcome {
    pub fn new(level: u32, score: u32, obstacle_count: usize) -> Self {
        Self {
            level,
            score,
            stars: star_rating(score, obstacle_count),
            percentage: percentage(score, obstacle_count),
        }
    }
}

/// Score as a percentage of the points available for `obstacle_count` repairs.
///
/// The maximum counts one repair step per obstacle, so fully repairing every
/// obstacle (three steps each) lands well above 100.
pub fn percentage(score: u32, obstacle_count: usize) -> f64 {
    let max_score = obstacle_count as f64 * POINTS_PER_REPAIR as f64;
    if max_score == 0.0 {
        return 0.0;
    }
    score as f64 / max_score * 100.0
}

/// Star rating for a score. Never below one star, even for a score of zero.
pub fn star_rating(score: u32, obstacle_count: usize) -> u8 {
    let pct = percentage(score, obstacle_count);
    if pct >= 90.0 {
        3
    } else if pct >= 70.0 {
        2
    } else {
        1
    }
}
