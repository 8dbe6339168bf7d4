//! Per-connection session state for a shard
//!
//! Every accepted connection owns exactly one session, inserted when the
//! connection joins and removed when it closes or is lost. A session tracks:
//! - The player currently controlled by the connection
//! - Whether an action arrived during the current round
//! - Whether it was skipped by the round timeout
//! - Whether it is waiting for an explicit reset after its player died

use crate::grid::PlayerId;
use log::info;
use std::collections::BTreeMap;

/// Connection identity inside one shard.
pub type SessionId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    /// Player spawned for this connection
    pub player: PlayerId,
    /// An action was received during the current round
    pub moved: bool,
    /// Timed out this round; keeps its previous direction and gets no frame
    pub ignore: bool,
    /// Player was eliminated, output is suppressed until the next reset
    pub resetting: bool,
}

impl Session {
    pub fn new(id: SessionId, player: PlayerId) -> Self {
        Self {
            id,
            player,
            moved: false,
            ignore: false,
            resetting: false,
        }
    }

    /// Active sessions take part in the round barrier.
    pub fn is_active(&self) -> bool {
        !self.resetting
    }

    /// Whether this session still blocks the current round.
    pub fn is_pending(&self) -> bool {
        self.is_active() && !self.moved && !self.ignore
    }

    pub fn clear_flags(&mut self) {
        self.moved = false;
        self.ignore = false;
        self.resetting = false;
    }
}

/// Sessions of one shard, ordered by id so every round visits them in
/// connection order.
#[derive(Debug)]
pub struct SessionStore {
    sessions: BTreeMap<SessionId, Session>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            max_sessions,
        }
    }

    pub fn is_full(&self) -> bool {
        self.sessions.len() >= self.max_sessions
    }

    /// Inserts a session for a new connection. Returns false if the shard is
    /// at capacity or the id is already taken.
    pub fn add_session(&mut self, id: SessionId, player: PlayerId) -> bool {
        if self.is_full() || self.sessions.contains_key(&id) {
            return false;
        }
        info!("Session {} joined with player {:?}", id, player);
        self.sessions.insert(id, Session::new(id, player));
        true
    }

    pub fn remove_session(&mut self, id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&id)?;
        info!("Session {} left", id);
        Some(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
