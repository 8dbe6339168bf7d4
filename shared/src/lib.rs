use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const DEFAULT_GRID_SIZE: usize = 40;
pub const DEFAULT_VISION_RANGE: usize = 5;
pub const DEFAULT_PORT: u16 = 9909;
/// Number of stacked planes in every observation.
pub const OBSERVATION_PLANES: usize = 4;

pub const CLAIM_PLANE: usize = 0;
pub const OCCUPANCY_PLANE: usize = 1;
pub const BORDER_PLANE: usize = 2;
pub const PLAYERS_PLANE: usize = 3;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] bincode::Error),
    #[error("unknown action index {0}")]
    UnknownAction(u8),
    #[error("observation of side {side} carries {cells} cells")]
    BadObservation { side: u32, cells: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Unit vector for this action. The y axis grows downwards.
    pub fn direction(self) -> Vector {
        match self {
            Action::Up => Vector::new(0, -1),
            Action::Down => Vector::new(0, 1),
            Action::Left => Vector::new(-1, 0),
            Action::Right => Vector::new(1, 0),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = ProtocolError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Action::ALL
            .get(index as usize)
            .copied()
            .ok_or(ProtocolError::UnknownAction(index))
    }
}

/// Stacked square planes centred on the observing player, row-major with
/// rows along the y axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub side: u32,
    pub cells: Vec<i8>,
}

impl Observation {
    pub fn empty(vision_range: usize) -> Self {
        let side = 2 * vision_range + 1;
        Self {
            side: side as u32,
            cells: vec![0; OBSERVATION_PLANES * side * side],
        }
    }

    pub fn side(&self) -> usize {
        self.side as usize
    }

    pub fn plane_count(&self) -> usize {
        let area = self.side() * self.side();
        if area == 0 {
            0
        } else {
            self.cells.len() / area
        }
    }

    /// Checks that `cells` holds exactly `OBSERVATION_PLANES` planes of
    /// `side * side` cells. Frames from a peer should pass this before
    /// `plane` or `get` is used on them.
    pub fn check_shape(&self) -> Result<(), ProtocolError> {
        let side = self.side();
        if side == 0 || self.cells.len() != OBSERVATION_PLANES * side * side {
            return Err(ProtocolError::BadObservation {
                side: self.side,
                cells: self.cells.len(),
            });
        }
        Ok(())
    }

    /// Cells of one plane. Panics if `plane` is out of range or the shape
    /// was not checked.
    pub fn plane(&self, plane: usize) -> &[i8] {
        let area = self.side() * self.side();
        &self.cells[plane * area..(plane + 1) * area]
    }

    pub fn get(&self, plane: usize, row: usize, col: usize) -> i8 {
        self.plane(plane)[row * self.side() + col]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    pub terminated: bool,
    pub truncated: bool,
    pub info: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    Move(Action),
    Reset,
    KeepAlive,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Tick(StepResult),
    Reset(Observation),
    Disconnected { reason: String },
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(bincode::serialize(message)?)
}

pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, ProtocolError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Reward for one tick: -1 on death, otherwise weighted territory and kill
/// gains clamped to [-5, 5].
pub fn reward(died: bool, claim_delta: i64, kill_delta: i64) -> f32 {
    if died {
        return -1.0;
    }
    let raw = 0.9 * claim_delta as f32 + 5.0 * kill_delta as f32;
    raw.clamp(-5.0, 5.0)
}
