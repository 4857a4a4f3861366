use rand::Rng;
use std::fmt;

/// Lower and upper bound of obstacle coordinates, in percent of the field
pub const FIELD_MIN: f64 = 10.0;
pub const FIELD_MAX: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub u32);

impl fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Tool {
    Hammer,
    Shovel,
    Tar,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Hammer, Tool::Shovel, Tool::Tar];

    /// Label shown on the tool palette
    pub fn action(&self) -> &'static str {
        match self {
            Tool::Hammer => "Crack Open",
            Tool::Shovel => "Clean",
            Tool::Tar => "Apply Tar",
        }
    }
}

/// Ordered repair progression of a single pothole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum_macros::Display)]
pub enum RepairStage {
    Unrepaired,
    Cracked,
    Cleaned,
    Repaired,
}

impl RepairStage {
    /// The stage reached after one successful repair action, `None` once repaired
    pub fn next(&self) -> Option<RepairStage> {
        match self {
            RepairStage::Unrepaired => Some(RepairStage::Cracked),
            RepairStage::Cracked => Some(RepairStage::Cleaned),
            RepairStage::Cleaned => Some(RepairStage::Repaired),
            RepairStage::Repaired => None,
        }
    }

    /// Tool that moves this stage forward
    pub fn required_tool(&self) -> Option<Tool> {
        match self {
            RepairStage::Unrepaired => Some(Tool::Hammer),
            RepairStage::Cracked => Some(Tool::Shovel),
            RepairStage::Cleaned => Some(Tool::Tar),
            RepairStage::Repaired => None,
        }
    }

    pub fn is_repaired(&self) -> bool {
        matches!(self, RepairStage::Repaired)
    }
}

/// A pothole placed on the road for one session.
///
/// Obstacles stay in the set for the whole session and remain visible once
/// repaired; only `stage` ever changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: Position,
    pub stage: RepairStage,
}

impl Obstacle {
    pub fn new(id: ObstacleId, position: Position) -> Self {
        Self {
            id,
            position,
            stage: RepairStage::Unrepaired,
        }
    }
}

/// Generate a fresh batch of unrepaired obstacles at independent random positions.
/// Overlapping positions are allowed.
pub fn init_obstacles<R: Rng>(count: usize, rng: &mut R) -> Vec<Obstacle> {
    (0..count)
        .map(|i| {
            let position = Position {
                x: rng.gen_range(FIELD_MIN..FIELD_MAX),
                y: rng.gen_range(FIELD_MIN..FIELD_MAX),
            };
            Obstacle::new(ObstacleId(i as u32), position)
        })
        .collect()
}
