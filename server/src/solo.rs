//! Single-player environment stepping a private game without any networking

use crate::error::{GameError, ServerError};
use crate::game::Game;
use crate::grid::PlayerId;
use shared::{reward, Action, Observation, StepResult};
use std::collections::HashMap;

pub const DEFAULT_MAX_STEPS: u32 = 300;

/// How `SoloEnv::step` scores a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewardMode {
    /// Same reward as the networked game
    #[default]
    Shared,
    /// +1 when the claim count grew, -0.1 when the position did not change
    Shaped,
}

pub struct SoloEnv {
    grid_size: usize,
    vision_range: usize,
    max_steps: u32,
    steps: u32,
    reward_mode: RewardMode,
    game: Game,
    player: PlayerId,
}

impl SoloEnv {
    pub fn new(grid_size: usize, vision_range: usize, max_steps: u32) -> Result<Self, ServerError> {
        let mut game = Game::new(grid_size, grid_size)?;
        let player = game.spawn_random_player()?;
        Ok(Self {
            grid_size,
            vision_range,
            max_steps,
            steps: 0,
            reward_mode: RewardMode::default(),
            game,
            player,
        })
    }

    pub fn with_reward_mode(mut self, reward_mode: RewardMode) -> Self {
        self.reward_mode = reward_mode;
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Starts a new episode on a fresh grid.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
    ) -> Result<(Observation, HashMap<String, String>), ServerError> {
        self.game = Game::with_seed(self.grid_size, self.grid_size, seed)?;
        self.player = self.game.spawn_random_player()?;
        self.steps = 0;

        let player = self
            .game
            .player(self.player)
            .ok_or(GameError::UnknownPlayer(self.player))?;
        Ok((self.game.observation(player, self.vision_range), HashMap::new()))
    }

    /// Applies one action and advances the game by one tick.
    pub fn step(&mut self, action: u8) -> Result<StepResult, ServerError> {
        let action =
            Action::try_from(action).map_err(|_| ServerError::UnknownAction(action))?;

        let (claims, kills, position) = self
            .game
            .player(self.player)
            .map(|p| (p.claim_count, p.kills, p.position))
            .ok_or(GameError::UnknownPlayer(self.player))?;
        self.game.set_direction(self.player, action)?;

        let removed = self.game.update();
        self.steps += 1;

        let (player, died) = match self.game.player(self.player) {
            Some(player) => (player, false),
            None => removed
                .iter()
                .find(|p| p.id == self.player)
                .map(|p| (p, true))
                .ok_or(GameError::UnknownPlayer(self.player))?,
        };

        let reward = match self.reward_mode {
            RewardMode::Shared => reward(
                died,
                player.claim_count as i64 - claims as i64,
                player.kills as i64 - kills as i64,
            ),
            RewardMode::Shaped => {
                let mut shaped = 0.0;
                if player.claim_count > claims {
                    shaped += 1.0;
                }
                if player.position == position {
                    shaped -= 0.1;
                }
                shaped
            }
        };

        Ok(StepResult {
            observation: self.game.observation(player, self.vision_range),
            reward,
            terminated: died,
            truncated: !died && self.steps >= self.max_steps,
            info: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{Vector, BORDER_PLANE, OBSERVATION_PLANES};
    use tokio_test::assert_ok;

    /// Shaped env whose only player starts at `position` on a 10x10 grid.
    fn shaped_at(position: Vector) -> SoloEnv {
        let mut env = SoloEnv::new(10, 2, DEFAULT_MAX_STEPS)
            .unwrap()
            .with_reward_mode(RewardMode::Shaped);
        env.game = Game::new(10, 10).unwrap();
        env.player = env.game.add_player(position);
        env
    }

    #[test]
    fn test_reset_observation() {
        let mut env = SoloEnv::new(10, 3, DEFAULT_MAX_STEPS).unwrap();
        let (observation, info) = assert_ok!(env.reset(Some(7)));

        assert_eq!(observation.side(), 7);
        assert_eq!(observation.plane_count(), OBSERVATION_PLANES);
        assert!(info.is_empty());
        assert_eq!(env.game().players().len(), 1);
        assert_eq!(env.game().tick, 0);
    }

    #[test]
    fn test_same_seed_same_spawn() {
        let mut first = SoloEnv::new(20, 2, DEFAULT_MAX_STEPS).unwrap();
        let mut second = SoloEnv::new(20, 2, DEFAULT_MAX_STEPS).unwrap();
        first.reset(Some(42)).unwrap();
        second.reset(Some(42)).unwrap();

        assert_eq!(
            first.game().players()[0].position,
            second.game().players()[0].position
        );
    }

    #[test]
    fn test_unknown_action() {
        let mut env = SoloEnv::new(10, 2, DEFAULT_MAX_STEPS).unwrap();
        assert!(matches!(env.step(4), Err(ServerError::UnknownAction(4))));
        assert_eq!(env.game().tick, 0);
    }

    #[test]
    fn test_walking_off_grid_terminates() {
        let mut env = SoloEnv::new(10, 2, DEFAULT_MAX_STEPS).unwrap();
        env.reset(Some(1)).unwrap();

        let mut last = None;
        for _ in 0..10 {
            let step = env.step(Action::Up.index()).unwrap();
            let done = step.terminated;
            last = Some(step);
            if done {
                break;
            }
        }

        let last = last.unwrap();
        assert!(last.terminated);
        assert!(!last.truncated);
        assert_approx_eq!(last.reward, -1.0);
        assert!(env.game().players().is_empty());
        // the dead player's window still shows the top border
        assert!(last.observation.plane(BORDER_PLANE).iter().any(|&c| c == 1));

        assert!(env.step(Action::Up.index()).is_err());
    }

    #[test]
    fn test_truncation_after_max_steps() {
        let mut env = SoloEnv::new(10, 2, 2).unwrap();
        env.reset(Some(3)).unwrap();

        // up then down keeps the player inside its spawn block
        let first = assert_ok!(env.step(Action::Up.index()));
        assert!(!first.truncated);
        assert_approx_eq!(first.reward, 0.0);

        let second = assert_ok!(env.step(Action::Down.index()));
        assert!(second.truncated);
        assert!(!second.terminated);
    }

    #[test]
    fn test_shaped_reward_for_capture() {
        let mut env = shaped_at(Vector::new(4, 4));

        // out through (6, 4) and (6, 5), back into the block at (5, 5)
        let moves = [Action::Right, Action::Right, Action::Down, Action::Left];
        let rewards: Vec<f32> = moves
            .iter()
            .map(|action| env.step(action.index()).unwrap().reward)
            .collect();

        assert_approx_eq!(rewards[0], 0.0);
        assert_approx_eq!(rewards[1], 0.0);
        assert_approx_eq!(rewards[2], 0.0);
        assert_approx_eq!(rewards[3], 1.0);
        assert_eq!(env.game().player(env.player).unwrap().claim_count, 11);
    }

    #[test]
    fn test_shaped_reward_for_standing_still() {
        let mut env = shaped_at(Vector::new(1, 1));

        assert_approx_eq!(env.step(Action::Left.index()).unwrap().reward, 0.0);

        // leaving the grid kills before the move, so the position is unchanged
        let last = assert_ok!(env.step(Action::Left.index()));
        assert!(last.terminated);
        assert_approx_eq!(last.reward, -0.1);
    }
}
