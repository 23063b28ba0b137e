use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    ErrorKind, GameSnapshot, LetterStatus, PlayerId, PlayerView, RoomCode, RoomSettings,
    RosterEntry,
};

/// Commands sent by the browser: `{"type": "make-guess", "payload": {"word": "gatto"}}`.
/// Commands without data omit `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
#[ts(export)]
pub enum ClientMessage {
    CreateRoom {
        player_name: String,
        #[serde(default)]
        rounds: Option<u32>,
        #[serde(default)]
        max_players: Option<usize>,
    },
    JoinRoom {
        room_code: String,
        player_name: String,
    },
    PlayerReady {
        is_ready: bool,
    },
    StartGame,
    MakeGuess {
        word: String,
    },
    SkipTurn,
    LeaveRoom,
    ChatMessage {
        message: String,
    },
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
#[ts(export)]
pub enum ServerMessage {
    Welcome {
        player_id: PlayerId,
    },
    RoomCreated {
        room_code: RoomCode,
        is_host: bool,
        settings: RoomSettings,
        roster: Vec<RosterEntry>,
    },
    RoomJoined {
        room_code: RoomCode,
        is_host: bool,
        settings: RoomSettings,
        roster: Vec<RosterEntry>,
    },
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
        roster: Vec<RosterEntry>,
    },
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
        new_host: Option<PlayerId>,
        roster: Vec<RosterEntry>,
    },
    RoomLeft,
    PlayerReadyUpdated {
        player_id: PlayerId,
        is_ready: bool,
        roster: Vec<RosterEntry>,
    },
    GameStarted {
        game_state: GameSnapshot,
    },
    GuessResult {
        player_id: PlayerId,
        player_name: String,
        word: String,
        result: Vec<LetterStatus>,
        attempts: u32,
        guessed: bool,
    },
    PlayerWonRound {
        player_id: PlayerId,
        player_name: String,
        points: u32,
        attempts: u32,
        total_score: u32,
    },
    RoundEnded {
        round_number: u32,
        secret_word: String,
    },
    NextRoundStarted {
        game_state: GameSnapshot,
    },
    GameEnded {
        winner: Option<PlayerView>,
        final_scores: Vec<PlayerView>,
    },
    TurnSkipped {
        player_id: PlayerId,
        player_name: String,
    },
    ChatMessage {
        player_id: PlayerId,
        player_name: String,
        message: String,
        timestamp: String,
    },
    Error {
        message: String,
        kind: ErrorKind,
    },
}
