use crate::grid::{Grid, PlayerId};
use serde::Serialize;
use shared::{Action, Vector};

pub const SPAWN_COLOR: [u8; 3] = [255, 255, 255];
pub const NEUTRAL_COLOR: [u8; 3] = [230, 230, 230];
pub const LEADER_COLOR: [u8; 3] = [230, 0, 0];

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub position: Vector,
    pub move_direction: Vector,
    pub is_alive: bool,
    pub color: [u8; 3],

    pub kills: u32,
    pub claim_count: u32,
    pub max_claim_count: u32,
    pub steps_survived: u32,
    pub moves_since_capture: u32,
}

impl Player {
    /// Fresh player facing down with no claims; `Game::add_player` grants
    /// the spawn block.
    pub fn new(id: PlayerId, position: Vector) -> Self {
        Self {
            id,
            position,
            move_direction: Action::Down.direction(),
            is_alive: true,
            color: SPAWN_COLOR,
            kills: 0,
            claim_count: 0,
            max_claim_count: 0,
            steps_survived: 0,
            moves_since_capture: 0,
        }
    }

    /// Cell the player enters on the next tick.
    pub fn destination(&self) -> Vector {
        self.position.offset(self.move_direction)
    }

    pub fn add_claims(&mut self, count: u32) {
        self.claim_count += count;
        self.max_claim_count = self.max_claim_count.max(self.claim_count);
    }

    /// Releases every tile this player occupies or claims and marks it dead.
    ///
    /// Scans the whole grid, so the cost is proportional to the grid area.
    pub fn kill(&mut self, grid: &mut Grid) {
        for tile in grid.tiles_mut() {
            if tile.occupant() == Some(self.id) {
                tile.unoccupy();
            }
            if tile.claimer() == Some(self.id) {
                tile.unclaim();
            }
        }
        self.is_alive = false;
    }

    /// Claim, occupancy and border planes of the square window centred on the
    /// player, each `(2 * radius + 1)^2` cells, concatenated in that order.
    pub fn vision(&self, grid: &Grid, radius: usize) -> Vec<i8> {
        let side = 2 * radius + 1;
        let area = side * side;
        let mut planes = vec![0i8; 3 * area];
        let r = radius as i32;

        for row in 0..side {
            for col in 0..side {
                let cell = row * side + col;
                let position = Vector::new(
                    self.position.x - r + col as i32,
                    self.position.y - r + row as i32,
                );

                let tile = match grid.tile(position) {
                    Some(tile) => tile,
                    None => {
                        planes[2 * area + cell] = 1;
                        continue;
                    }
                };

                planes[cell] = self.relation(tile.claimer());
                planes[area + cell] = self.relation(tile.occupant());
            }
        }

        planes
    }

    fn relation(&self, owner: Option<PlayerId>) -> i8 {
        match owner {
            Some(id) if id == self.id => -1,
            Some(_) => 1,
            None => 0,
        }
    }
}
