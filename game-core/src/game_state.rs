use chrono::{DateTime, Utc};
use game_types::{
    GameSnapshot, GuessRecord, MAX_ATTEMPTS, PlayerId, PlayerView, RoomCode, RoundPhase,
    SessionId, SessionStatus, WORD_LENGTH,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{GameError, GameEvent, ScoringPolicy, WordSource, evaluate_guess, is_solved};

pub const MIN_PLAYERS: usize = 1;

/// One participant's standing inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProgress {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub current_attempt: u32,
    pub has_guessed: bool,
    pub guesses: Vec<GuessRecord>,
}

impl PlayerProgress {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            current_attempt: 0,
            has_guessed: false,
            guesses: Vec::new(),
        }
    }

    /// Solved the word or ran out of attempts.
    pub fn is_done(&self) -> bool {
        self.has_guessed || self.current_attempt >= MAX_ATTEMPTS
    }

    fn reset_round(&mut self) {
        self.current_attempt = 0;
        self.has_guessed = false;
        self.guesses.clear();
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            current_attempt: self.current_attempt,
            has_guessed: self.has_guessed,
            guesses: self.guesses.clone(),
        }
    }
}

/// A single "guess this word" episode. Replaced, never mutated, when the
/// next round begins.
#[derive(Debug, Clone)]
pub struct RoundState {
    number: u32,
    secret_word: String,
    started_at: DateTime<Utc>,
}

impl RoundState {
    fn new(number: u32, secret_word: String, started_at: DateTime<Utc>) -> Self {
        Self {
            number,
            secret_word,
            started_at,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn seconds_elapsed(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.started_at).num_seconds()).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    room_code: RoomCode,
    players: Vec<PlayerProgress>,
    round: RoundState,
    max_rounds: u32,
    status: SessionStatus,
    phase: RoundPhase,
    winner: Option<PlayerId>,
    scoring: ScoringPolicy,
}

impl GameSession {
    /// Begin round 1 with a fresh word. Roster order is kept and decides ties.
    pub fn start(
        room_code: RoomCode,
        roster: impl IntoIterator<Item = (PlayerId, String)>,
        max_rounds: u32,
        words: &dyn WordSource,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        let players: Vec<PlayerProgress> = roster
            .into_iter()
            .map(|(id, name)| PlayerProgress::new(id, name))
            .collect();

        if players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers { min: MIN_PLAYERS });
        }

        let secret_word = words.random_word()?;
        let session = Self {
            id: Uuid::new_v4(),
            room_code,
            players,
            round: RoundState::new(1, secret_word, now),
            max_rounds: max_rounds.max(1),
            status: SessionStatus::Playing,
            phase: RoundPhase::AcceptingGuesses,
            winner: None,
            scoring: ScoringPolicy::default(),
        };

        info!(
            "Session {} started in room {} with {} players, {} rounds",
            session.id,
            session.room_code,
            session.players.len(),
            session.max_rounds
        );
        debug!("Secret word for room {}: {}", session.room_code, session.round.secret_word);

        Ok(session)
    }

    /// Check, evaluate and record one guess. Rejected guesses leave the
    /// session untouched and do not use up an attempt.
    pub fn submit_guess(
        &mut self,
        player_id: PlayerId,
        word: &str,
        words: &dyn WordSource,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.status != SessionStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        if self.phase == RoundPhase::RoundComplete {
            return Err(GameError::RoundNotAcceptingGuesses);
        }

        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;

        if self.players[index].is_done() {
            return Err(GameError::RoundAlreadyCompleteForPlayer);
        }

        let guess = word.trim().to_lowercase();
        let length = guess.chars().count();
        if length != WORD_LENGTH {
            return Err(GameError::InvalidLength {
                expected: WORD_LENGTH,
                actual: length,
            });
        }
        if !words.contains(&guess) {
            return Err(GameError::NotInDictionary { word: guess });
        }

        let result = evaluate_guess(&self.round.secret_word, &guess)?;
        let guessed = is_solved(&result);
        let seconds = self.round.seconds_elapsed(now);

        let player = &mut self.players[index];
        player.current_attempt += 1;
        player.guesses.push(GuessRecord {
            word: guess.clone(),
            result: result.clone(),
            timestamp: now.to_rfc3339(),
        });

        let mut events = vec![GameEvent::GuessEvaluated {
            player_id,
            player_name: player.name.clone(),
            word: guess,
            result,
            attempts: player.current_attempt,
            guessed,
        }];

        if guessed {
            let points = self.scoring.score(player.current_attempt, seconds);
            player.has_guessed = true;
            player.score += points;
            info!(
                "{} solved round {} in room {} ({} attempts, {}s, +{} points)",
                player.name, self.round.number, self.room_code, player.current_attempt, seconds, points
            );
            events.push(GameEvent::PlayerWonRound {
                player_id,
                player_name: player.name.clone(),
                points,
                attempts: player.current_attempt,
                total_score: player.score,
            });
        }

        if let Some(event) = self.complete_round_if_done() {
            events.push(event);
        }

        Ok(events)
    }

    /// Drop a player. Their departure may finish the round for everyone else.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        self.players.remove(index);

        if self.players.is_empty() {
            self.status = SessionStatus::Finished;
            return Ok(Vec::new());
        }

        Ok(self.complete_round_if_done().into_iter().collect())
    }

    fn complete_round_if_done(&mut self) -> Option<GameEvent> {
        if self.status != SessionStatus::Playing
            || self.phase != RoundPhase::AcceptingGuesses
            || !self.is_round_complete()
        {
            return None;
        }

        self.phase = RoundPhase::RoundComplete;
        info!("Round {} complete in room {}", self.round.number, self.room_code);
        Some(GameEvent::RoundCompleted {
            round_number: self.round.number,
            secret_word: self.round.secret_word.clone(),
        })
    }

    pub fn is_round_complete(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(PlayerProgress::is_done)
    }

    /// Move past a completed round: either a new word or the end of the game.
    pub fn advance_round(
        &mut self,
        words: &dyn WordSource,
        now: DateTime<Utc>,
    ) -> Result<GameEvent, GameError> {
        if self.status != SessionStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        if self.phase != RoundPhase::RoundComplete {
            return Err(GameError::RoundInProgress);
        }

        if self.round.number < self.max_rounds {
            let secret_word = words.random_word()?;
            self.round = RoundState::new(self.round.number + 1, secret_word, now);
            for player in &mut self.players {
                player.reset_round();
            }
            self.phase = RoundPhase::AcceptingGuesses;

            info!(
                "Round {}/{} started in room {}",
                self.round.number, self.max_rounds, self.room_code
            );
            debug!("Secret word for room {}: {}", self.room_code, self.round.secret_word);

            return Ok(GameEvent::NextRoundStarted {
                snapshot: self.snapshot(),
            });
        }

        self.status = SessionStatus::Finished;
        let winner = self.leader().map(PlayerProgress::view);
        self.winner = winner.as_ref().map(|w| w.id);

        info!(
            "Game over in room {}: winner {:?} | {:?}",
            self.room_code,
            winner.as_ref().map(|w| &w.name),
            self.players
                .iter()
                .map(|p| format!("{}: {}", p.name, p.score))
                .collect::<Vec<_>>()
        );

        Ok(GameEvent::GameEnded {
            winner,
            final_scores: self.players.iter().map(PlayerProgress::view).collect(),
        })
    }

    /// Highest score; on a tie the player earliest in roster order wins.
    pub fn leader(&self) -> Option<&PlayerProgress> {
        self.players.iter().fold(None, |best, player| match best {
            Some(current) if current.score >= player.score => Some(current),
            _ => Some(player),
        })
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            room_code: self.room_code.clone(),
            status: self.status,
            round_phase: self.phase,
            current_round: self.round.number,
            max_rounds: self.max_rounds,
            max_attempts: MAX_ATTEMPTS,
            word_length: WORD_LENGTH,
            players: self.players.iter().map(PlayerProgress::view).collect(),
            winner: self.winner,
            round_started_at: self.round.started_at.to_rfc3339(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn players(&self) -> &[PlayerProgress] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerProgress> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Only for logging and the round-end reveal.
    pub fn secret_word(&self) -> &str {
        &self.round.secret_word
    }
}
