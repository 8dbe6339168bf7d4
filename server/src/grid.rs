//! Tile grid shared by every player of a game instance.
//!
//! Tiles never own players. Occupancy and claims are stored as [`PlayerId`]
//! handles into the game's player table, so removing a player can never leave
//! a tile pointing at freed state.

use serde::Serialize;
use shared::Vector;

/// Opaque player identity, unique within one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PlayerId(pub u32);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tile {
    occupant: Option<PlayerId>,
    claimer: Option<PlayerId>,
}

impl Tile {
    pub fn occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn claimed(&self) -> bool {
        self.claimer.is_some()
    }

    pub fn occupant(&self) -> Option<PlayerId> {
        self.occupant
    }

    pub fn claimer(&self) -> Option<PlayerId> {
        self.claimer
    }

    pub fn occupy(&mut self, player: PlayerId) {
        self.occupant = Some(player);
    }

    pub fn unoccupy(&mut self) {
        self.occupant = None;
    }

    pub fn claim(&mut self, player: PlayerId) {
        self.claimer = Some(player);
    }

    pub fn unclaim(&mut self) {
        self.claimer = None;
    }
}

/// Fixed-size `width x height` tile array, indexed `[y][x]`.
#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::default(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, position: Vector) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as usize) < self.width
            && (position.y as usize) < self.height
    }

    fn index(&self, position: Vector) -> Option<usize> {
        if self.contains(position) {
            Some(position.y as usize * self.width + position.x as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, position: Vector) -> Option<&Tile> {
        self.index(position).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, position: Vector) -> Option<&mut Tile> {
        self.index(position).map(move |i| &mut self.tiles[i])
    }

    pub fn tiles(&self) -> impl Iterator<Item = (Vector, &Tile)> + '_ {
        let width = self.width;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            (Vector::new((i % width) as i32, (i / width) as i32), tile)
        })
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> + '_ {
        self.tiles.iter_mut()
    }

    /// Number of tiles currently claimed by `player`.
    pub fn claimed_by(&self, player: PlayerId) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.claimer == Some(player))
            .count()
    }

    /// Number of tiles currently occupied by `player`.
    pub fn occupied_by(&self, player: PlayerId) -> usize {
        self.tiles
            .iter()
            .filter(|tile| tile.occupant == Some(player))
            .count()
    }
}
