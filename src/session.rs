//! Level session state machine.
//!
//! A session is a plain value. Every input (tool selection, obstacle
//! activation, clock reading, timer tick, pause) goes through [`reduce`],
//! which returns the next state together with the notices the front end
//! should surface. Nothing here reads a clock or spawns work: time arrives
//! as `Duration` readings from the caller's monotonic clock.

use std::fmt;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;

use crate::difficulty::{difficulty_for, DifficultyProfile};
use crate::obstacle::{init_obstacles, Obstacle, ObstacleId, RepairStage, Tool};
use crate::outcome::{Outcome, POINTS_PER_REPAIR};

pub const DEFAULT_REPAIR_DELAY_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Time a validated repair takes before it commits
    pub repair_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            repair_delay: Duration::from_millis(DEFAULT_REPAIR_DELAY_MS),
        }
    }
}

/// A validated repair waiting for its delay to elapse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingRepair {
    pub obstacle_id: ObstacleId,
    pub tool: Tool,
    pub ready_at: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub config: SessionConfig,
    pub level: u32,
    pub difficulty: DifficultyProfile,
    pub obstacles: Vec<Obstacle>,
    pub score: u32,
    pub remaining_secs: u32,
    pub selected_tool: Option<Tool>,
    pub pending: Option<PendingRepair>,
    pub paused: bool,
    // Completion latch: set once, never cleared for the life of the session
    pub outcome: Option<Outcome>,
}

impl SessionState {
    pub fn new<R: Rng>(level: u32, config: SessionConfig, rng: &mut R) -> Self {
        let difficulty = difficulty_for(level);
        let obstacles = init_obstacles(difficulty.obstacle_count, rng);

        info!(
            "level {} started: {} potholes, {}s on the clock",
            level, difficulty.obstacle_count, difficulty.time_limit_secs
        );

        Self {
            config,
            level,
            difficulty,
            obstacles,
            score: 0,
            remaining_secs: difficulty.time_limit_secs,
            selected_tool: None,
            pending: None,
            paused: false,
            outcome: None,
        }
    }

    pub fn is_repairing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn first_unrepaired(&self) -> Option<ObstacleId> {
        self.obstacles
            .iter()
            .find(|o| !o.stage.is_repaired())
            .map(|o| o.id)
    }

    pub fn repaired_count(&self) -> usize {
        self.obstacles
            .iter()
            .filter(|o| o.stage.is_repaired())
            .count()
    }

    /// Share of fully repaired obstacles, rounded to a whole percent
    pub fn repair_progress(&self) -> u8 {
        if self.obstacles.is_empty() {
            return 0;
        }
        ((self.repaired_count() as f64 / self.obstacles.len() as f64) * 100.0).round() as u8
    }

    fn all_repaired(&self) -> bool {
        self.obstacles.iter().all(|o| o.stage.is_repaired())
    }

    /// Whether tool and obstacle input is currently accepted
    pub fn accepts_input(&self) -> bool {
        !self.is_complete() && !self.paused && !self.is_repairing()
    }

    fn complete(&mut self) {
        if self.outcome.is_none() {
            self.outcome = Some(Outcome::new(
                self.level,
                self.score,
                self.difficulty.obstacle_count,
            ));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    SelectTool(Tool),
    ActivateObstacle { id: ObstacleId, now: Duration },
    /// Select `tool` and use it on the first obstacle that still needs work
    UseTool { tool: Tool, now: Duration },
    Clock(Duration),
    TimerTick { elapsed_secs: u32 },
    Pause,
    Resume,
}

/// Something the player should be told about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    WrongTool { id: ObstacleId, expected: Tool },
    RepairStarted { id: ObstacleId, tool: Tool },
    Progress {
        id: ObstacleId,
        stage: RepairStage,
        points: u32,
    },
    Completed(Outcome),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::WrongTool { expected, .. } => {
                write!(f, "Wrong tool! You need the {} first", expected)
            }
            Notice::RepairStarted { id, tool } => write!(f, "Working on {} with the {}...", id, tool),
            Notice::Progress { points, .. } => write!(f, "Progress! +{} points", points),
            Notice::Completed(outcome) => {
                let plural = if outcome.stars == 1 { "" } else { "s" };
                write!(f, "Level complete! You earned {} star{}!", outcome.stars, plural)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: SessionState,
    pub notices: Vec<Notice>,
}

/// Apply one event to a session.
///
/// `Notice::Completed` is emitted only by the step that sets the completion
/// latch, so a session reports its outcome at most once regardless of which
/// path (timer or last repair) got there first.
pub fn reduce(state: SessionState, event: SessionEvent) -> Step {
    let was_complete = state.is_complete();
    let mut notices = Vec::new();

    let state = match event {
        SessionEvent::SelectTool(tool) => select_tool(state, tool),
        SessionEvent::ActivateObstacle { id, now } => {
            activate_obstacle(state, id, now, &mut notices)
        }
        SessionEvent::UseTool { tool, now } => {
            if !state.accepts_input() {
                debug!("ignoring {} while busy", tool);
                state
            } else {
                let state = select_tool(state, tool);
                match state.first_unrepaired() {
                    Some(id) => activate_obstacle(state, id, now, &mut notices),
                    None => state,
                }
            }
        }
        SessionEvent::Clock(now) => resolve_pending(state, now, &mut notices),
        SessionEvent::TimerTick { elapsed_secs } => advance_timer(state, elapsed_secs),
        SessionEvent::Pause => set_paused(state, true),
        SessionEvent::Resume => set_paused(state, false),
    };

    if !was_complete {
        if let Some(outcome) = state.outcome {
            info!(
                "level {} complete: score {}, {} stars",
                outcome.level, outcome.score, outcome.stars
            );
            notices.push(Notice::Completed(outcome));
        }
    }

    Step { state, notices }
}

/// Count the session clock down by `elapsed_secs`.
///
/// Frozen while paused or complete. Reaching zero completes the session.
pub fn advance_timer(mut state: SessionState, elapsed_secs: u32) -> SessionState {
    if state.is_complete() || state.paused || elapsed_secs == 0 {
        return state;
    }

    state.remaining_secs = state.remaining_secs.saturating_sub(elapsed_secs);
    if state.remaining_secs == 0 {
        state.complete();
    }
    state
}

/// Start the same level over with fresh obstacles, score and clock
pub fn retry<R: Rng>(state: &SessionState, rng: &mut R) -> SessionState {
    SessionState::new(state.level, state.config, rng)
}

fn select_tool(mut state: SessionState, tool: Tool) -> SessionState {
    if !state.accepts_input() {
        debug!("tool change to {} rejected", tool);
        return state;
    }
    state.selected_tool = Some(tool);
    state
}

fn set_paused(mut state: SessionState, paused: bool) -> SessionState {
    if !state.is_complete() {
        state.paused = paused;
    }
    state
}

fn activate_obstacle(
    mut state: SessionState,
    id: ObstacleId,
    now: Duration,
    notices: &mut Vec<Notice>,
) -> SessionState {
    if !state.accepts_input() {
        debug!("activation of {} rejected", id);
        return state;
    }

    let Some(stage) = state.obstacle(id).map(|o| o.stage) else {
        debug!("no obstacle {}", id);
        return state;
    };

    // Already repaired
    let Some(expected) = stage.required_tool() else {
        return state;
    };

    match state.selected_tool {
        Some(tool) if tool == expected => {
            state.pending = Some(PendingRepair {
                obstacle_id: id,
                tool,
                ready_at: now + state.config.repair_delay,
            });
            notices.push(Notice::RepairStarted { id, tool });
        }
        _ => notices.push(Notice::WrongTool { id, expected }),
    }
    state
}

fn resolve_pending(
    mut state: SessionState,
    now: Duration,
    notices: &mut Vec<Notice>,
) -> SessionState {
    let Some(pending) = state.pending else {
        return state;
    };
    if now < pending.ready_at {
        return state;
    }

    state.pending = None;
    if state.is_complete() {
        debug!("repair of {} finished after the session ended", pending.obstacle_id);
        return state;
    }

    let Some(obstacle) = state
        .obstacles
        .iter_mut()
        .find(|o| o.id == pending.obstacle_id)
    else {
        return state;
    };
    let Some(next) = obstacle.stage.next() else {
        return state;
    };

    obstacle.stage = next;
    state.score += POINTS_PER_REPAIR;
    notices.push(Notice::Progress {
        id: pending.obstacle_id,
        stage: next,
        points: POINTS_PER_REPAIR,
    });

    if state.all_repaired() {
        state.complete();
    }
    state
}
