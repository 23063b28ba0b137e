use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type SessionId = Uuid;

pub const WORD_LENGTH: usize = 5;
pub const MAX_ATTEMPTS: u32 = 6;
pub const ROOM_CODE_LENGTH: usize = 4;

/// Four uppercase ASCII letters identifying a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct RoomCode(String);

impl RoomCode {
    /// Accepts any case, rejects anything that is not exactly four letters.
    pub fn parse(raw: &str) -> Option<Self> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() == ROOM_CODE_LENGTH && code.chars().all(|c| c.is_ascii_uppercase()) {
            Some(Self(code))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum LetterStatus {
    Correct, // Green - right letter, right position
    Present, // Yellow - letter is in the word elsewhere
    Absent,  // Gray - no unconsumed occurrence left
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GuessRecord {
    pub word: String,
    pub result: Vec<LetterStatus>,
    pub timestamp: String, // ISO 8601 string
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionStatus {
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum RoundPhase {
    AcceptingGuesses,
    RoundComplete,
}

/// Public view of one player's progress. Safe to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub current_attempt: u32,
    pub has_guessed: bool,
    pub guesses: Vec<GuessRecord>,
}

/// Client-visible game state. Never carries the secret word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameSnapshot {
    pub room_code: RoomCode,
    pub status: SessionStatus,
    pub round_phase: RoundPhase,
    pub current_round: u32,
    pub max_rounds: u32,
    pub max_attempts: u32,
    pub word_length: usize,
    pub players: Vec<PlayerView>,
    pub winner: Option<PlayerId>,
    pub round_started_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_parse() {
        assert_eq!(RoomCode::parse("abcd").unwrap().as_str(), "ABCD");
        assert_eq!(RoomCode::parse(" QWER ").unwrap().as_str(), "QWER");
        assert!(RoomCode::parse("ABC").is_none());
        assert!(RoomCode::parse("ABCDE").is_none());
        assert!(RoomCode::parse("AB1D").is_none());
        assert!(RoomCode::parse("ÀBCD").is_none());
    }

    #[test]
    fn test_letter_status_wire_format() {
        let json = serde_json::to_string(&vec![
            LetterStatus::Correct,
            LetterStatus::Present,
            LetterStatus::Absent,
        ])
        .unwrap();
        assert_eq!(json, r#"["correct","present","absent"]"#);
    }
}
