use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::{DashMap, Entry};
use minesweeper_common::{
    models::{GameParams, Pos},
    protocol::{Action, BoardState, PlayAgentRequest, PlayAgentResponse},
};
use nanoid::nanoid;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    agent::{self, build_agent},
    error::{GameError, Result},
    logic::Game,
};

/// One live game. Only reachable through the registry's per-session lock.
pub struct Session {
    game: Game,
    created_at: Instant,
    last_activity: Instant,
}

impl Session {
    fn new(game: Game) -> Self {
        let now = Instant::now();
        Self {
            game,
            created_at: now,
            last_activity: now,
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn should_cleanup(&self, inactive_timeout: Duration, max_age: Duration) -> bool {
        let now = Instant::now();
        now.duration_since(self.last_activity) > inactive_timeout
            || now.duration_since(self.created_at) > max_age
    }
}

/// Maps game ids to sessions. Operations on one game are serialized by its
/// mutex; different games never contend.
#[derive(Clone, Default)]
pub struct Registry {
    games: Arc<DashMap<String, Arc<Mutex<Session>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    #[instrument(level = "trace", skip(self, game))]
    fn add_game(&self, game: Game) -> String {
        let mut id_length = 5;
        let max_attempts_per_length = 10;

        loop {
            for _ in 0..max_attempts_per_length {
                let id = nanoid!(id_length);
                match self.games.entry(id.clone()) {
                    Entry::Occupied(_) => {
                        debug!("Game ID collision, trying another: {}", id);
                        continue;
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(Arc::new(Mutex::new(Session::new(game))));
                        info!("Created new game with ID: {}", id);
                        return id;
                    }
                }
            }

            warn!(
                "Exhausted ID attempts at length {}, increasing to {}",
                id_length,
                id_length + 1
            );
            id_length += 1;
        }
    }

    fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>> {
        match self.games.get(id) {
            Some(entry) => Ok(entry.value().clone()),
            None => {
                warn!("Request for non-existent game: {}", id);
                Err(GameError::UnknownGame(id.to_string()))
            }
        }
    }

    pub fn insert(&self, game: Game) -> (String, BoardState) {
        let state = game.snapshot();
        (self.add_game(game), state)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn new_game(&self, params: &GameParams) -> Result<(String, BoardState)> {
        let game = Game::generate(params)?;
        Ok(self.insert(game))
    }

    pub async fn state(&self, id: &str) -> Result<BoardState> {
        let session = self.session(id)?;
        let session = session.lock().await;
        Ok(session.game.snapshot())
    }

    /// Applies a client action. Actions the game cannot take leave it
    /// unchanged and still report the current state.
    #[instrument(level = "trace", skip(self))]
    pub async fn step(&self, id: &str, action: Action, pos: Pos) -> Result<BoardState> {
        let session = self.session(id)?;
        let mut session = session.lock().await;
        session.touch();

        let game = &mut session.game;
        let result = match action {
            // Revealing an open number is a chord reveal.
            Action::Reveal if game.board().cell(pos).is_ok_and(|cell| cell.is_revealed()) => {
                game.mass_reveal(pos).map(|_| ())
            }
            Action::Reveal => game.reveal(pos).map(|_| ()),
            Action::Flag => game.toggle_flag(pos).map(|_| ()),
        };

        match result {
            Ok(()) => {}
            Err(GameError::InvalidAction(reason)) => {
                debug!("No-op {:?} at {} in game {}: {}", action, pos, id, reason);
            }
            Err(e) => return Err(e),
        }

        Ok(game.snapshot())
    }

    /// Runs an agent on an existing game, or on a fresh one when `id` is
    /// `None`. The session stays locked for the whole run.
    #[instrument(level = "trace", skip(self, request), fields(agent = request.agent.name()))]
    pub async fn play_agent(
        &self,
        id: Option<&str>,
        request: &PlayAgentRequest,
    ) -> Result<PlayAgentResponse> {
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                let params = request.params.clone().unwrap_or_default();
                self.new_game(&params)?.0
            }
        };

        let session = self.session(&id)?;
        let mut session = session.lock().await;
        session.touch();

        let mut agent = build_agent(request.agent, request.seed);
        let run = agent::play(&mut session.game, agent.as_mut());

        Ok(PlayAgentResponse {
            game_id: id,
            frames: run.frames,
            final_state: run.final_state,
        })
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        match self.games.remove(id) {
            Some(_) => {
                info!("Removed game: {}", id);
                Ok(())
            }
            None => Err(GameError::UnknownGame(id.to_string())),
        }
    }

    /// Drops expired sessions. Sessions currently locked are in use and
    /// are left alone. Returns how many were removed.
    pub fn cleanup(&self, inactive_timeout: Duration, max_age: Duration) -> usize {
        let expired: Vec<String> = self
            .games
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .is_ok_and(|session| session.should_cleanup(inactive_timeout, max_age))
            })
            .map(|entry| entry.key().clone())
            .collect();

        for id in &expired {
            self.games.remove(id);
            debug!("Cleaned up game: {}", id);
        }

        expired.len()
    }
}
