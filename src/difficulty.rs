/// Tuning parameters derived from a level number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub obstacle_count: usize,
    pub obstacle_speed: f64, // Seconds per traffic pass, drives the decorative cars
    pub time_limit_secs: u32,
}

pub const MIN_OBSTACLES: usize = 5;
pub const MAX_OBSTACLES: usize = 15;
pub const MIN_SPEED: f64 = 3.0;
pub const MAX_SPEED: f64 = 8.0;
pub const MIN_TIME_LIMIT_SECS: u32 = 30;
pub const MAX_TIME_LIMIT_SECS: u32 = 60;

/// Map a level to its difficulty profile.
///
/// Every field is capped: more potholes and faster traffic as levels climb,
/// less time, until the bounds are hit.
pub fn difficulty_for(level: u32) -> DifficultyProfile {
    let obstacle_count = (MIN_OBSTACLES + (level / 2) as usize).min(MAX_OBSTACLES);
    let obstacle_speed = (MIN_SPEED + level as f64 * 0.5).min(MAX_SPEED);
    let time_limit_secs = MAX_TIME_LIMIT_SECS
        .saturating_sub(level.saturating_mul(2))
        .max(MIN_TIME_LIMIT_SECS);

    DifficultyProfile {
        obstacle_count,
        obstacle_speed,
        time_limit_secs,
    }
}

/// Short hint shown on the early levels
pub fn tutorial_hint(level: u32) -> Option<&'static str> {
    match level {
        1 => Some("Pick the right tool and fix the potholes!"),
        2 => Some("Watch out for cars - they're getting faster!"),
        3 => Some("Time is limited - fix potholes quickly!"),
        4 => Some("More potholes appear in higher levels!"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_one_profile() {
        let profile = difficulty_for(1);

        assert_eq!(profile.obstacle_count, 5);
        assert_eq!(profile.obstacle_speed, 3.5);
        assert_eq!(profile.time_limit_secs, 58);
    }

    #[test]
    fn test_mid_level_profile() {
        let profile = difficulty_for(7);

        assert_eq!(profile.obstacle_count, 8);
        assert_eq!(profile.obstacle_speed, 6.5);
        assert_eq!(profile.time_limit_secs, 46);
    }

    #[test]
    fn test_caps_reached() {
        assert_eq!(difficulty_for(10).obstacle_speed, MAX_SPEED);
        assert_eq!(difficulty_for(15).time_limit_secs, MIN_TIME_LIMIT_SECS);
        assert_eq!(difficulty_for(20).obstacle_count, MAX_OBSTACLES);
        assert_eq!(difficulty_for(1_000).obstacle_count, MAX_OBSTACLES);
    }

    #[test]
    fn test_huge_level_does_not_overflow() {
        let profile = difficulty_for(u32::MAX);

        assert_eq!(profile.obstacle_count, MAX_OBSTACLES);
        assert_eq!(profile.obstacle_speed, MAX_SPEED);
        assert_eq!(profile.time_limit_secs, MIN_TIME_LIMIT_SECS);
    }

    #[test]
    fn test_tutorial_hints() {
        assert!(tutorial_hint(1).is_some());
        assert!(tutorial_hint(4).is_some());
        assert_eq!(tutorial_hint(5), None);
        assert_eq!(tutorial_hint(0), None);
    }

    proptest! {
        #[test]
        fn profile_stays_in_bounds(level in 1u32..10_000) {
            let p = difficulty_for(level);
            prop_assert!((MIN_OBSTACLES..=MAX_OBSTACLES).contains(&p.obstacle_count));
            prop_assert!((MIN_TIME_LIMIT_SECS..=MAX_TIME_LIMIT_SECS).contains(&p.time_limit_secs));
            prop_assert!(p.obstacle_speed >= MIN_SPEED && p.obstacle_speed <= MAX_SPEED);
        }

        #[test]
        fn harder_levels_never_get_easier(level in 1u32..10_000) {
            let here = difficulty_for(level);
            let next = difficulty_for(level + 1);
            prop_assert!(next.obstacle_count >= here.obstacle_count);
            prop_assert!(next.time_limit_secs <= here.time_limit_secs);
            prop_assert!(next.obstacle_speed >= here.obstacle_speed);
        }
    }
}
