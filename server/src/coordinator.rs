//! Round barrier deciding when a shard advances its game
//!
//! A round opens with the first action received after a tick. The tick fires
//! as soon as every active session has either acted or been skipped by the
//! round timeout, and exactly one `Game::update` runs per round:
//!
//! `Idle -> AwaitingActions -> (barrier satisfied | timed out) -> tick applied -> Idle`
//!
//! The coordinator owns no sockets. Every operation returns the frames that
//! must be delivered, tagged with the receiving session.

use crate::error::{GameError, ServerError};
use crate::game::Game;
use crate::grid::PlayerId;
use crate::session::{SessionId, SessionStore};
use log::{debug, info, warn};
use shared::{reward, Action, Observation, ServerMessage, StepResult, Vector};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Frames produced by one coordinator operation.
pub type Outbox = Vec<(SessionId, ServerMessage)>;

/// Round progress. A deadline exists only while a round is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    Idle,
    AwaitingActions { deadline: Instant },
}

/// Owns the game and the sessions of one shard and decides when ticks run.
pub struct TickCoordinator {
    game: Game,
    sessions: SessionStore,
    vision_range: usize,
    round_timeout: Duration,
    round: RoundState,
}

impl TickCoordinator {
    /// Wraps `game` with room for `max_sessions` connections. Each open
    /// round waits at most `round_timeout` for missing actions.
    pub fn new(game: Game, vision_range: usize, round_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            game,
            sessions: SessionStore::new(max_sessions),
            vision_range,
            round_timeout,
            round: RoundState::Idle,
        }
    }

    /// Current game state, read-only.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Connected sessions with their round flags.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn round(&self) -> RoundState {
        self.round
    }

    /// When the running round times out, if one is running.
    pub fn deadline(&self) -> Option<Instant> {
        match self.round {
            RoundState::AwaitingActions { deadline } => Some(deadline),
            RoundState::Idle => None,
        }
    }

    /// Registers a connection and spawns its player on a random free cell.
    pub fn join(&mut self, id: SessionId) -> Result<(), ServerError> {
        if self.sessions.is_full() {
            return Err(ServerError::ServerFull);
        }
        let player = self.game.spawn_random_player()?;
        self.attach(id, player)
    }

    /// Registers a connection whose player starts at `position`.
    pub fn join_at(&mut self, id: SessionId, position: Vector) -> Result<(), ServerError> {
        if self.sessions.is_full() {
            return Err(ServerError::ServerFull);
        }
        let player = self.game.add_player(position);
        self.attach(id, player)
    }

    fn attach(&mut self, id: SessionId, player: PlayerId) -> Result<(), ServerError> {
        if !self.sessions.add_session(id, player) {
            self.game.kill_player(player);
            return Err(ServerError::ServerFull);
        }
        Ok(())
    }

    /// Removes a connection and its player. A pending round may fire if the
    /// departing session was the last one it waited for.
    pub fn leave(&mut self, id: SessionId) -> Outbox {
        if let Some(session) = self.sessions.remove_session(id) {
            self.game.kill_player(session.player);
        }

        if self.round != RoundState::Idle && !self.any_moved() {
            debug!("Round abandoned, no remaining session has acted");
            self.round = RoundState::Idle;
            return Vec::new();
        }
        self.try_fire()
    }

    /// Records the action of one session for the current round.
    pub fn submit(&mut self, id: SessionId, action: Action, now: Instant) -> Outbox {
        let session = match self.sessions.get_mut(id) {
            Some(session) => session,
            None => {
                warn!("Action from unknown session {}", id);
                return Vec::new();
            }
        };

        if self.game.set_direction(session.player, action).is_err() {
            debug!("Session {} has no live player, dropping {:?}", id, action);
            return Vec::new();
        }
        session.moved = true;
        session.ignore = false;
        session.resetting = false;

        if self.round == RoundState::Idle {
            self.round = RoundState::AwaitingActions {
                deadline: now + self.round_timeout,
            };
        }
        self.try_fire()
    }

    /// Skips every session that has not acted once the round deadline has
    /// passed, then fires the tick.
    pub fn time_out(&mut self, now: Instant) -> Outbox {
        match self.round {
            RoundState::AwaitingActions { deadline } if now >= deadline => {}
            _ => return Vec::new(),
        }

        let mut skipped = 0;
        for session in self.sessions.iter_mut().filter(|s| s.is_pending()) {
            session.ignore = true;
            skipped += 1;
        }
        if skipped > 0 {
            warn!("Round timed out, skipping {} session(s)", skipped);
        }

        if self.barrier_satisfied() {
            self.fire()
        } else {
            self.round = RoundState::Idle;
            Vec::new()
        }
    }

    /// Replaces the session's player with a fresh one and returns its first
    /// observation without waiting for the round.
    pub fn reset(&mut self, id: SessionId) -> Result<Observation, ServerError> {
        let session = self
            .sessions
            .get_mut(id)
            .ok_or(ServerError::UnknownSession(id))?;

        self.game.kill_player(session.player);
        let player = match self.game.spawn_random_player() {
            Ok(player) => player,
            Err(e) => {
                session.resetting = true;
                return Err(e.into());
            }
        };
        session.player = player;
        session.clear_flags();
        info!("Session {} reset with player {:?}", id, player);

        let player = self
            .game
            .player(player)
            .ok_or(GameError::UnknownPlayer(player))?;
        Ok(self.game.observation(player, self.vision_range))
    }

    fn any_moved(&self) -> bool {
        self.sessions.iter().any(|s| s.is_active() && s.moved)
    }

    fn barrier_satisfied(&self) -> bool {
        self.round != RoundState::Idle
            && self.any_moved()
            && !self.sessions.iter().any(|s| s.is_pending())
    }

    fn try_fire(&mut self) -> Outbox {
        if self.barrier_satisfied() {
            self.fire()
        } else {
            Vec::new()
        }
    }

    fn fire(&mut self) -> Outbox {
        self.round = RoundState::Idle;

        let before: HashMap<PlayerId, (u32, u32)> = self
            .game
            .players()
            .iter()
            .map(|p| (p.id, (p.claim_count, p.kills)))
            .collect();
        for session in self.sessions.iter_mut() {
            session.moved = false;
        }

        let removed = self.game.update();

        let mut outbox = Vec::new();
        for session in self.sessions.iter_mut() {
            let (claims, kills) = match before.get(&session.player) {
                Some(&snapshot) => snapshot,
                None => continue,
            };
            let (player, died) = match self.game.player(session.player) {
                Some(player) => (player, false),
                None => match removed.iter().find(|p| p.id == session.player) {
                    Some(player) => (player, true),
                    None => continue,
                },
            };

            // Eliminations are always reported, even to skipped sessions.
            if died {
                session.resetting = true;
            } else if session.ignore || session.resetting {
                continue;
            }

            let step = StepResult {
                observation: self.game.observation(player, self.vision_range),
                reward: reward(
                    died,
                    player.claim_count as i64 - claims as i64,
                    player.kills as i64 - kills as i64,
                ),
                terminated: died,
                truncated: false,
                info: HashMap::new(),
            };
            outbox.push((session.id, ServerMessage::Tick(step)));
        }

        debug!(
            "Tick {}: {} frame(s), {} eliminated",
            self.game.tick,
            outbox.len(),
            removed.len()
        );
        outbox
    }
}
