use std::time::Duration;

use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use potholes::obstacle::{RepairStage, Tool};
use potholes::outcome::POINTS_PER_REPAIR;
use potholes::session::{reduce, Notice, SessionConfig, SessionEvent, SessionState};

fn tool_strategy() -> impl Strategy<Value = Tool> {
    prop_oneof![Just(Tool::Hammer), Just(Tool::Shovel), Just(Tool::Tar)]
}

fn stage_rank(stage: RepairStage) -> u32 {
    match stage {
        RepairStage::Unrepaired => 0,
        RepairStage::Cracked => 1,
        RepairStage::Cleaned => 2,
        RepairStage::Repaired => 3,
    }
}

proptest! {
    // Whatever the player mashes, score always equals committed stages
    // and no obstacle ever moves backwards.
    #[test]
    fn score_tracks_committed_stages(
        seed in any::<u64>(),
        level in 1u32..=12,
        presses in prop::collection::vec((tool_strategy(), 0usize..15, 0u64..400), 0..60),
    ) {
        let config = SessionConfig { repair_delay: Duration::from_millis(100) };
        let mut state = SessionState::new(level, config, &mut StdRng::seed_from_u64(seed));
        let mut now = Duration::ZERO;
        let mut completions = 0;

        for (tool, idx, wait_ms) in presses {
            let before: Vec<u32> = state.obstacles.iter().map(|o| stage_rank(o.stage)).collect();

            let id = state.obstacles[idx % state.obstacles.len()].id;
            let events = [
                SessionEvent::SelectTool(tool),
                SessionEvent::ActivateObstacle { id, now },
                SessionEvent::Clock(now + Duration::from_millis(wait_ms)),
                SessionEvent::TimerTick { elapsed_secs: (wait_ms / 100) as u32 },
            ];
            for event in events {
                let step = reduce(state, event);
                completions += step
                    .notices
                    .iter()
                    .filter(|n| matches!(n, Notice::Completed(_)))
                    .count();
                state = step.state;
            }
            now += Duration::from_millis(wait_ms);

            let after: Vec<u32> = state.obstacles.iter().map(|o| stage_rank(o.stage)).collect();
            prop_assert!(before.iter().zip(&after).all(|(b, a)| a >= b));

            let committed: u32 = after.iter().sum();
            prop_assert_eq!(state.score, committed * POINTS_PER_REPAIR);
        }

        prop_assert!(completions <= 1);
        prop_assert_eq!(completions == 1, state.is_complete());
    }
}
