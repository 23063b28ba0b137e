#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use game_core::{GameError, GameEvent, GameSession, WordSource};
use game_types::{PlayerId, RoomCode};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

pub const DICTIONARY: &[&str] = &[
    "gatto", "mondo", "fiore", "panda", "anana", "llama", "salca", "casal", "ferro", "monte",
];

/// Hands out secret words in a fixed order so tests know what to guess.
pub struct ScriptedWords {
    secrets: Mutex<VecDeque<String>>,
}

impl ScriptedWords {
    pub fn new(secrets: &[&str]) -> Self {
        Self {
            secrets: Mutex::new(secrets.iter().map(|w| w.to_string()).collect()),
        }
    }
}

impl WordSource for ScriptedWords {
    fn random_word(&self) -> Result<String, GameError> {
        self.secrets
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(GameError::EmptyWordList)
    }

    fn contains(&self, word: &str) -> bool {
        DICTIONARY.contains(&word)
    }
}

pub fn test_room_code() -> RoomCode {
    RoomCode::parse("TEST").unwrap()
}

/// Creates a playing session with one id per name, in roster order
pub fn start_session(
    names: &[&str],
    rounds: u32,
    words: &ScriptedWords,
) -> (GameSession, Vec<PlayerId>, DateTime<Utc>) {
    let ids: Vec<PlayerId> = names.iter().map(|_| Uuid::new_v4()).collect();
    let started = Utc::now();
    let roster = ids
        .iter()
        .zip(names)
        .map(|(id, name)| (*id, name.to_string()));
    let session = GameSession::start(test_room_code(), roster, rounds, words, started).unwrap();
    (session, ids, started)
}

/// Submits `guess` until the player runs out of attempts
pub fn exhaust_attempts(
    session: &mut GameSession,
    player: PlayerId,
    guess: &str,
    words: &ScriptedWords,
    at: DateTime<Utc>,
) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..6 {
        events.extend(session.submit_guess(player, guess, words, at).unwrap());
    }
    events
}

pub fn seconds_after(start: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    start + Duration::seconds(secs)
}

pub fn count_round_completed(events: &[GameEvent]) -> usize {
    events.iter().filter(|e| e.is_round_completed()).count()
}
