use crate::error::GameError;
use crate::grid::{Grid, PlayerId};
use crate::player::{Player, LEADER_COLOR, NEUTRAL_COLOR};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Action, Observation, Vector, PLAYERS_PLANE};
use std::collections::HashMap;

/// Resampling budget for random spawns before the grid is considered full.
const MAX_SPAWN_ATTEMPTS: usize = 128;

/// Authoritative state of one game instance.
#[derive(Debug)]
pub struct Game {
    pub tick: u64,
    grid: Grid,
    players: Vec<Player>,
    leader: Option<PlayerId>,
    next_player_id: u32,
    rng: StdRng,
}

impl Game {
    /// Creates an empty game with an entropy-seeded spawn generator.
    pub fn new(width: usize, height: usize) -> Result<Self, GameError> {
        Self::with_seed(width, height, None)
    }

    /// Creates an empty game. The same `seed` produces the same sequence of
    /// random spawns; `None` falls back to entropy.
    ///
    /// Both sides must be at least 3 so a spawn block fits.
    pub fn with_seed(width: usize, height: usize, seed: Option<u64>) -> Result<Self, GameError> {
        if width < 3 || height < 3 {
            return Err(GameError::GridTooSmall { width, height });
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            tick: 0,
            grid: Grid::new(width, height),
            players: Vec::new(),
            leader: None,
            next_player_id: 1,
            rng,
        })
    }

    /// Read-only view of the tiles, for observers and tests.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Live players in join order. Eliminated players are removed by
    /// `update` and `kill_player`.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Looks up a live player; `None` once it has been eliminated.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Player holding the best `max_claim_count`, tinted with the leader colour.
    pub fn leader(&self) -> Option<PlayerId> {
        self.leader
    }

    /// Sets the direction a player moves in on every following tick until it
    /// is changed again.
    pub fn set_direction(&mut self, id: PlayerId, action: Action) -> Result<(), GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::UnknownPlayer(id))?;
        player.move_direction = action.direction();
        Ok(())
    }

    /// Highest `claim_count` among live players.
    pub fn get_max_score(&self) -> u32 {
        self.players
            .iter()
            .map(|p| p.claim_count)
            .max()
            .unwrap_or(0)
    }

    /// Adds a player at `position`, moved one cell inwards if it lies on the
    /// outer border, and claims the 3x3 block around it.
    pub fn add_player(&mut self, position: Vector) -> PlayerId {
        let position = self.nudge_inwards(position);
        let id = PlayerId(self.next_player_id);
        self.next_player_id += 1;

        let mut player = Player::new(id, position);
        let mut taken_from = Vec::new();
        let mut claimed = 0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                let cell = Vector::new(position.x + dx, position.y + dy);
                if let Some(tile) = self.grid.tile_mut(cell) {
                    if let Some(previous) = tile.claimer() {
                        taken_from.push(previous);
                    }
                    tile.claim(id);
                    claimed += 1;
                }
            }
        }

        for previous in taken_from {
            if let Some(owner) = self.players.iter_mut().find(|p| p.id == previous) {
                owner.claim_count = owner.claim_count.saturating_sub(1);
            }
        }

        player.add_claims(claimed);
        info!("Added player {:?} at ({}, {})", id, position.x, position.y);
        self.players.push(player);
        id
    }

    /// Spawns a player on a uniformly random free cell.
    pub fn spawn_random_player(&mut self) -> Result<PlayerId, GameError> {
        let width = self.grid.width() as i32;
        let height = self.grid.height() as i32;

        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let candidate = Vector::new(
                self.rng.gen_range(0..width),
                self.rng.gen_range(0..height),
            );
            let position = self.nudge_inwards(candidate);

            if self.players.iter().any(|p| p.position == position) {
                continue;
            }
            if self.grid.tile(position).and_then(|t| t.occupant()).is_some() {
                continue;
            }

            return Ok(self.add_player(position));
        }

        Err(GameError::GridSaturated)
    }

    /// Kills and removes a player outside of the tick cycle.
    pub fn kill_player(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let mut player = self.players.remove(index);
        player.kill(&mut self.grid);
        if self.leader == Some(id) {
            self.leader = None;
        }
        info!("Removed player {:?}", id);
        Some(player)
    }

    /// Vision planes of `player` plus the positions of every other live
    /// player inside the window.
    pub fn observation(&self, player: &Player, vision_range: usize) -> Observation {
        let side = 2 * vision_range + 1;
        let area = side * side;
        let mut cells = player.vision(&self.grid, vision_range);
        cells.resize(cells.len() + area, 0);

        let left = player.position.x - vision_range as i32;
        let top = player.position.y - vision_range as i32;

        for other in self.players.iter().filter(|p| p.id != player.id) {
            let col = other.position.x - left;
            let row = other.position.y - top;
            if (0..side as i32).contains(&col) && (0..side as i32).contains(&row) {
                cells[PLAYERS_PLANE * area + row as usize * side + col as usize] = -1;
            }
        }

        Observation {
            side: side as u32,
            cells,
        }
    }

    /// Advances every live player by one tick and returns the players that
    /// were eliminated.
    ///
    /// Collision, capture and same-cell decisions are each taken against the
    /// state at the start of their phase, so the result does not depend on
    /// the order of the player list.
    pub fn update(&mut self) -> Vec<Player> {
        self.tick += 1;

        let index: HashMap<PlayerId, usize> = self
            .players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();
        let mut dead = vec![false; self.players.len()];
        let mut credits = vec![0u32; self.players.len()];

        // Collisions: leaving the grid kills the mover, stepping onto a trail
        // kills whoever left it.
        for (i, player) in self.players.iter().enumerate() {
            let tile = match self.grid.tile(player.destination()) {
                Some(tile) => tile,
                None => {
                    dead[i] = true;
                    continue;
                }
            };

            if let Some(occupant) = tile.occupant() {
                if tile.claimer() != Some(occupant) {
                    if let Some(&victim) = index.get(&occupant) {
                        dead[victim] = true;
                        if victim != i {
                            credits[i] += 1;
                        }
                    }
                }
            }
        }
        self.apply_deaths(&dead);

        let survivors: Vec<usize> = (0..self.players.len()).filter(|&i| !dead[i]).collect();

        let capturing: Vec<usize> = survivors
            .iter()
            .copied()
            .filter(|&i| {
                let player = &self.players[i];
                let claimer_at = |position| self.grid.tile(position).and_then(|t| t.claimer());
                claimer_at(player.destination()) == Some(player.id)
                    && claimer_at(player.position) != Some(player.id)
            })
            .collect();

        for &i in &survivors {
            let player = &mut self.players[i];
            player.steps_survived += 1;
            player.moves_since_capture += 1;
        }

        for i in capturing {
            self.capture(i);
        }

        for &i in &survivors {
            let player = &mut self.players[i];
            player.position = player.destination();
            if let Some(tile) = self.grid.tile_mut(player.position) {
                if tile.claimer() != Some(player.id) {
                    tile.occupy(player.id);
                }
            }
        }

        // Same-cell collisions, resolved pairwise in join order.
        let mut crashed = vec![false; self.players.len()];
        for (n, &a) in survivors.iter().enumerate() {
            for &b in &survivors[n + 1..] {
                let (first, second) = (&self.players[a], &self.players[b]);
                if first.position != second.position {
                    continue;
                }
                match self.grid.tile(first.position).and_then(|t| t.claimer()) {
                    Some(owner) if owner == first.id => {
                        crashed[b] = true;
                        credits[a] += 1;
                    }
                    Some(owner) if owner == second.id => {
                        crashed[a] = true;
                        credits[b] += 1;
                    }
                    _ => {
                        crashed[a] = true;
                        crashed[b] = true;
                    }
                }
            }
        }
        self.apply_deaths(&crashed);

        for (player, credit) in self.players.iter_mut().zip(credits) {
            player.kills += credit;
        }

        let (alive, removed): (Vec<Player>, Vec<Player>) =
            self.players.drain(..).partition(|p| p.is_alive);
        self.players = alive;

        for player in &removed {
            debug!(
                "Tick {}: player {:?} eliminated after {} steps",
                self.tick, player.id, player.steps_survived
            );
        }

        self.update_leader();
        removed
    }

    fn apply_deaths(&mut self, dead: &[bool]) {
        for (player, &is_dead) in self.players.iter_mut().zip(dead) {
            if is_dead && player.is_alive {
                player.kill(&mut self.grid);
            }
        }
    }

    /// Converts the trail of player `i` into claimed territory.
    fn capture(&mut self, i: usize) {
        let id = self.players[i].id;
        let mut converted = 0;
        let mut taken_from = Vec::new();

        for tile in self.grid.tiles_mut() {
            if tile.occupant() != Some(id) {
                continue;
            }
            tile.unoccupy();
            match tile.claimer() {
                Some(owner) if owner == id => continue,
                Some(owner) => taken_from.push(owner),
                None => {}
            }
            tile.claim(id);
            converted += 1;
        }

        for owner in taken_from {
            if let Some(previous) = self.players.iter_mut().find(|p| p.id == owner) {
                previous.claim_count = previous.claim_count.saturating_sub(1);
            }
        }

        let player = &mut self.players[i];
        if converted > 0 {
            player.add_claims(converted);
            player.moves_since_capture = 0;
            debug!("Player {:?} captured {} tiles", id, converted);
        }
    }

    fn update_leader(&mut self) {
        let mut leader = self.leader.filter(|id| self.player(*id).is_some());
        let mut best = leader
            .and_then(|id| self.player(id))
            .map(|p| p.max_claim_count)
            .unwrap_or(0);

        for player in &self.players {
            if player.max_claim_count > best {
                best = player.max_claim_count;
                leader = Some(player.id);
            }
        }

        self.leader = leader;
        for player in &mut self.players {
            player.color = if Some(player.id) == leader {
                LEADER_COLOR
            } else {
                NEUTRAL_COLOR
            };
        }
    }

    fn nudge_inwards(&self, position: Vector) -> Vector {
        let max_x = self.grid.width() as i32 - 2;
        let max_y = self.grid.height() as i32 - 2;
        Vector::new(position.x.clamp(1, max_x), position.y.clamp(1, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{BORDER_PLANE, CLAIM_PLANE};

    fn walk(game: &mut Game, id: PlayerId, actions: &[Action]) -> Vec<Player> {
        let mut removed = Vec::new();
        for &action in actions {
            if game.player(id).is_some() {
                game.set_direction(id, action).unwrap();
            }
            removed.extend(game.update());
        }
        removed
    }

    #[test]
    fn test_grid_too_small() {
        assert!(matches!(
            Game::new(2, 10),
            Err(GameError::GridTooSmall { width: 2, height: 10 })
        ));
    }

    #[test]
    fn test_add_player_claims_neighbourhood() {
        let mut game = Game::new(10, 10).unwrap();
        let id = game.add_player(Vector::new(4, 4));

        let player = game.player(id).unwrap();
        assert_eq!(player.claim_count, 9);
        assert_eq!(player.max_claim_count, 9);
        assert_eq!(game.grid().claimed_by(id), 9);
        assert_eq!(game.get_max_score(), 9);
    }

    #[test]
    fn test_add_player_nudges_off_border() {
        let mut game = Game::new(10, 10).unwrap();
        let a = game.add_player(Vector::new(0, 9));
        let b = game.add_player(Vector::new(9, 0));
        assert_eq!(game.player(a).unwrap().position, Vector::new(1, 8));
        assert_eq!(game.player(b).unwrap().position, Vector::new(8, 1));
    }

    #[test]
    fn test_overlapping_spawn_takes_tiles() {
        let mut game = Game::new(10, 10).unwrap();
        let a = game.add_player(Vector::new(3, 3));
        let b = game.add_player(Vector::new(4, 3));

        // b's block overlaps six of a's tiles
        assert_eq!(game.player(a).unwrap().claim_count, 3);
        assert_eq!(game.grid().claimed_by(a), 3);
        assert_eq!(game.player(b).unwrap().claim_count, 9);
    }

    #[test]
    fn test_spawn_random_player_is_seeded() {
        let mut first = Game::with_seed(20, 20, Some(7)).unwrap();
        let mut second = Game::with_seed(20, 20, Some(7)).unwrap();
        let a = first.spawn_random_player().unwrap();
        let b = second.spawn_random_player().unwrap();
        assert_eq!(
            first.player(a).unwrap().position,
            second.player(b).unwrap().position
        );
    }

    #[test]
    fn test_spawn_random_player_stays_inside() {
        let mut game = Game::with_seed(5, 5, Some(1)).unwrap();
        for _ in 0..4 {
            let id = game.spawn_random_player().unwrap();
            let position = game.player(id).unwrap().position;
            assert!((1..=3).contains(&position.x));
            assert!((1..=3).contains(&position.y));
        }
    }

    #[test]
    fn test_spawn_random_player_saturates() {
        let mut game = Game::with_seed(3, 3, Some(1)).unwrap();
        game.spawn_random_player().unwrap();
        assert!(matches!(
            game.spawn_random_player(),
            Err(GameError::GridSaturated)
        ));
    }

    #[test]
    fn test_moving_off_grid_kills() {
        let mut game = Game::new(5, 5).unwrap();
        let id = game.add_player(Vector::new(1, 1));

        let removed = walk(&mut game, id, &[Action::Left, Action::Left]);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, id);
        assert!(!removed[0].is_alive);
        assert!(game.player(id).is_none());
        assert_eq!(game.grid().claimed_by(id), 0);
        assert_eq!(game.grid().occupied_by(id), 0);
    }

    #[test]
    fn test_move_leaves_trail_outside_territory() {
        let mut game = Game::new(10, 10).unwrap();
        let id = game.add_player(Vector::new(2, 2));

        walk(&mut game, id, &[Action::Right, Action::Right, Action::Right]);

        let player = game.player(id).unwrap();
        assert_eq!(player.position, Vector::new(5, 2));
        assert_eq!(player.steps_survived, 3);
        assert_eq!(player.moves_since_capture, 3);
        // (3, 2) is inside the spawn block, (4, 2) and (5, 2) are trail
        assert_eq!(game.grid().occupied_by(id), 2);
        assert_eq!(player.claim_count, 9);
    }

    #[test]
    fn test_closing_loop_captures_trail() {
        let mut game = Game::new(10, 10).unwrap();
        let id = game.add_player(Vector::new(2, 2));

        // out along row 2, down, and back through row 3 into the spawn block
        walk(
            &mut game,
            id,
            &[
                Action::Right,
                Action::Right,
                Action::Right,
                Action::Down,
                Action::Left,
            ],
        );
        let trail = game.grid().occupied_by(id);
        assert_eq!(trail, 4);
        let before = game.player(id).unwrap().claim_count;

        walk(&mut game, id, &[Action::Left]);

        let player = game.player(id).unwrap();
        assert_eq!(player.claim_count, before + trail as u32);
        assert_eq!(player.max_claim_count, player.claim_count);
        assert_eq!(player.moves_since_capture, 0);
        assert_eq!(game.grid().occupied_by(id), 0);
        assert_eq!(game.grid().claimed_by(id) as u32, player.claim_count);
    }

    #[test]
    fn test_capture_takes_tiles_from_other_owner() {
        let mut game = Game::new(12, 12).unwrap();
        let a = game.add_player(Vector::new(2, 2));
        let b = game.add_player(Vector::new(9, 1));

        // a leaves its block, trail at (4, 2) and (5, 2)
        walk(&mut game, a, &[Action::Right, Action::Right, Action::Right]);
        assert_eq!(game.player(a).unwrap().position, Vector::new(5, 2));

        // the tile under a belongs to b
        game.grid.tile_mut(Vector::new(5, 2)).unwrap().claim(b);
        game.players.iter_mut().find(|p| p.id == b).unwrap().claim_count += 1;
        let a_before = game.player(a).unwrap().claim_count;
        let b_before = game.player(b).unwrap().claim_count;

        walk(&mut game, a, &[Action::Down, Action::Left, Action::Left]);

        let capturer = game.player(a).unwrap();
        assert_eq!(capturer.position, Vector::new(3, 3));
        assert_eq!(capturer.claim_count, a_before + 4);
        assert_eq!(game.player(b).unwrap().claim_count, b_before - 1);
        assert_eq!(game.grid().claimed_by(a) as u32, capturer.claim_count);
        assert_eq!(
            game.grid().tile(Vector::new(5, 2)).unwrap().claimer(),
            Some(a)
        );
    }

    #[test]
    fn test_trail_crossing_credits_mover() {
        let mut game = Game::new(10, 10).unwrap();
        let a = game.add_player(Vector::new(2, 2));
        let b = game.add_player(Vector::new(6, 5));

        // a: (2,2) -> (2,3) own -> (2,4) trail -> (2,5) trail
        game.set_direction(a, Action::Down).unwrap();
        game.set_direction(b, Action::Up).unwrap();
        game.update();
        game.set_direction(b, Action::Down).unwrap();
        game.update();
        game.update();
        assert_eq!(game.player(a).unwrap().position, Vector::new(2, 5));
        assert_eq!(game.grid().tile(Vector::new(2, 4)).unwrap().occupant(), Some(a));

        // place b beside a's trail and step onto it
        if let Some(player) = game.players.iter_mut().find(|p| p.id == b) {
            player.position = Vector::new(3, 4);
        }
        game.set_direction(a, Action::Right).unwrap();
        game.set_direction(b, Action::Left).unwrap();
        let removed = game.update();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, a);
        let mover = game.player(b).unwrap();
        assert_eq!(mover.kills, 1);
        assert_eq!(mover.position, Vector::new(2, 4));
        assert_eq!(game.grid().occupied_by(a), 0);
    }

    #[test]
    fn test_head_on_collision_on_open_ground_kills_both() {
        for swap in [false, true] {
            let mut game = Game::new(12, 12).unwrap();
            let (left_pos, right_pos) = (Vector::new(2, 5), Vector::new(8, 5));
            let (a, b) = if swap {
                let b = game.add_player(right_pos);
                let a = game.add_player(left_pos);
                (a, b)
            } else {
                let a = game.add_player(left_pos);
                let b = game.add_player(right_pos);
                (a, b)
            };

            // both walk to (5, 5): a needs 3 steps, b needs 3 steps
            let mut removed = Vec::new();
            for _ in 0..3 {
                game.set_direction(a, Action::Right).unwrap();
                game.set_direction(b, Action::Left).unwrap();
                removed.extend(game.update());
            }

            let ids: Vec<PlayerId> = removed.iter().map(|p| p.id).collect();
            assert!(ids.contains(&a) && ids.contains(&b), "swap = {}", swap);
            assert!(game.players().is_empty());
        }
    }

    #[test]
    fn test_same_cell_on_own_claim_wins() {
        let mut game = Game::new(12, 12).unwrap();
        let a = game.add_player(Vector::new(3, 5));
        let b = game.add_player(Vector::new(7, 5));

        let moves = [
            (Action::Up, Action::Left),
            (Action::Down, Action::Left),
            (Action::Right, Action::Left),
        ];
        let mut removed = Vec::new();
        for (a_move, b_move) in moves {
            game.set_direction(a, a_move).unwrap();
            game.set_direction(b, b_move).unwrap();
            removed.extend(game.update());
        }

        // both arrived on (4, 5), which a owns
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, b);
        assert_eq!(removed[0].position, Vector::new(4, 5));
        let winner = game.player(a).unwrap();
        assert_eq!(winner.position, Vector::new(4, 5));
        assert_eq!(winner.kills, 1);
        assert_eq!(game.grid().claimed_by(b), 0);
        assert_eq!(game.grid().occupied_by(b), 0);
    }

    /// Hands `cell` to `owner` outside of the tick cycle.
    fn grant(game: &mut Game, owner: PlayerId, cell: Vector) {
        game.grid.tile_mut(cell).unwrap().claim(owner);
        game.players
            .iter_mut()
            .find(|p| p.id == owner)
            .unwrap()
            .claim_count += 1;
    }

    #[test]
    fn test_trail_on_foreign_claim_kills_its_owner() {
        let mut game = Game::new(12, 12).unwrap();
        let a = game.add_player(Vector::new(2, 2));
        let b = game.add_player(Vector::new(8, 8));
        let c = game.add_player(Vector::new(3, 9));
        grant(&mut game, b, Vector::new(5, 2));

        // a walks out across b's tile while b and c pace inside their blocks
        for pace in [Action::Up, Action::Down, Action::Up, Action::Down] {
            game.set_direction(a, Action::Right).unwrap();
            game.set_direction(b, pace).unwrap();
            game.set_direction(c, pace).unwrap();
            assert!(game.update().is_empty());
        }
        let crossed = game.grid().tile(Vector::new(5, 2)).unwrap();
        assert_eq!(crossed.occupant(), Some(a));
        assert_eq!(crossed.claimer(), Some(b));

        if let Some(player) = game.players.iter_mut().find(|p| p.id == c) {
            player.position = Vector::new(5, 3);
        }
        game.set_direction(a, Action::Right).unwrap();
        game.set_direction(b, Action::Up).unwrap();
        game.set_direction(c, Action::Up).unwrap();
        let removed = game.update();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, a);
        assert_eq!(game.player(c).unwrap().kills, 1);
        assert_eq!(game.player(b).unwrap().kills, 0);
        assert_eq!(game.grid().occupied_by(a), 0);

        let tile = game.grid().tile(Vector::new(5, 2)).unwrap();
        assert_eq!(tile.claimer(), Some(b));
        assert_eq!(tile.occupant(), Some(c));
        let owner = game.player(b).unwrap();
        assert_eq!(owner.claim_count, 10);
        assert_eq!(game.grid().claimed_by(b) as u32, owner.claim_count);
    }

    #[test]
    fn test_same_cell_on_third_party_claim_kills_both() {
        let mut game = Game::new(12, 12).unwrap();
        let a = game.add_player(Vector::new(2, 5));
        let b = game.add_player(Vector::new(8, 5));
        let c = game.add_player(Vector::new(5, 10));
        grant(&mut game, c, Vector::new(5, 5));

        let mut removed = Vec::new();
        for pace in [Action::Up, Action::Down, Action::Up] {
            game.set_direction(a, Action::Right).unwrap();
            game.set_direction(b, Action::Left).unwrap();
            game.set_direction(c, pace).unwrap();
            removed.extend(game.update());
        }

        let mut ids: Vec<PlayerId> = removed.iter().map(|p| p.id).collect();
        ids.sort_by_key(|id| id.0);
        assert_eq!(ids, vec![a, b]);
        assert!(removed.iter().all(|p| p.position == Vector::new(5, 5)));

        let owner = game.player(c).unwrap();
        assert_eq!(owner.kills, 0);
        let tile = game.grid().tile(Vector::new(5, 5)).unwrap();
        assert_eq!(tile.claimer(), Some(c));
        assert_eq!(tile.occupant(), None);
    }

    /// Three players starting three cells left, right and above (5, 5).
    fn three_way(game: &mut Game) -> [PlayerId; 3] {
        [
            game.add_player(Vector::new(2, 5)),
            game.add_player(Vector::new(8, 5)),
            game.add_player(Vector::new(5, 2)),
        ]
    }

    fn converge(game: &mut Game, [a, b, c]: [PlayerId; 3]) -> Vec<Player> {
        let mut removed = Vec::new();
        for _ in 0..3 {
            game.set_direction(a, Action::Right).unwrap();
            game.set_direction(b, Action::Left).unwrap();
            game.set_direction(c, Action::Down).unwrap();
            removed.extend(game.update());
        }
        removed
    }

    #[test]
    fn test_three_way_collision_on_open_ground_kills_all() {
        let mut game = Game::new(12, 12).unwrap();
        let players = three_way(&mut game);

        let removed = converge(&mut game, players);

        assert_eq!(removed.len(), 3);
        assert!(removed.iter().all(|p| p.position == Vector::new(5, 5)));
        assert!(removed.iter().all(|p| p.kills == 0));
        assert!(game.players().is_empty());
    }

    #[test]
    fn test_three_way_collision_on_owned_tile_spares_owner() {
        let mut game = Game::new(12, 12).unwrap();
        let [a, b, c] = three_way(&mut game);
        grant(&mut game, a, Vector::new(5, 5));

        let removed = converge(&mut game, [a, b, c]);

        let mut ids: Vec<PlayerId> = removed.iter().map(|p| p.id).collect();
        ids.sort_by_key(|id| id.0);
        assert_eq!(ids, vec![b, c]);

        let owner = game.player(a).unwrap();
        assert_eq!(owner.position, Vector::new(5, 5));
        assert_eq!(owner.kills, 2);
        // the trail cell (4, 5) was captured on arrival
        assert_eq!(owner.claim_count, 11);
        assert_eq!(game.grid().claimed_by(a) as u32, owner.claim_count);
        assert_eq!(game.grid().tile(Vector::new(5, 5)).unwrap().occupant(), None);
    }

    #[test]
    fn test_leader_tint() {
        let mut game = Game::new(12, 12).unwrap();
        let a = game.add_player(Vector::new(2, 2));
        let b = game.add_player(Vector::new(8, 8));

        game.update();
        // equal scores: first player to reach the best keeps it
        assert_eq!(game.leader(), Some(a));
        assert_eq!(game.player(a).unwrap().color, LEADER_COLOR);
        assert_eq!(game.player(b).unwrap().color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_observation_marks_other_players() {
        let mut game = Game::new(10, 10).unwrap();
        let a = game.add_player(Vector::new(2, 2));
        let b = game.add_player(Vector::new(4, 3));
        let _far = game.add_player(Vector::new(8, 8));

        let observer = game.player(a).unwrap().clone();
        let observation = game.observation(&observer, 2);

        assert_eq!(observation.side(), 5);
        assert_eq!(observation.plane_count(), 4);
        assert_eq!(observation.get(PLAYERS_PLANE, 3, 4), -1);
        assert_eq!(
            observation.plane(PLAYERS_PLANE).iter().filter(|&&c| c == -1).count(),
            1
        );
        assert_eq!(observation.get(CLAIM_PLANE, 2, 2), -1);
        assert!(observation.plane(BORDER_PLANE).iter().all(|&c| c == 0));
        assert!(game.player(b).is_some());
    }

    #[test]
    fn test_kill_player_releases_territory() {
        let mut game = Game::new(10, 10).unwrap();
        let id = game.add_player(Vector::new(4, 4));
        let removed = game.kill_player(id).unwrap();

        assert!(!removed.is_alive);
        assert!(game.players().is_empty());
        assert_eq!(game.grid().claimed_by(id), 0);
        assert_eq!(game.get_max_score(), 0);
        assert!(game.kill_player(id).is_none());
    }
}
