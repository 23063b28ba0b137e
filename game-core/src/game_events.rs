use game_types::{GameSnapshot, LetterStatus, PlayerId, PlayerView, ServerMessage};

/// Everything the engine reports back after a state change. The server
/// turns each event into one broadcast.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted {
        snapshot: GameSnapshot,
    },
    GuessEvaluated {
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
    RoundCompleted {
        round_number: u32,
        secret_word: String,
    },
    NextRoundStarted {
        snapshot: GameSnapshot,
    },
    GameEnded {
        winner: Option<PlayerView>,
        final_scores: Vec<PlayerView>,
    },
}

impl GameEvent {
    pub fn is_round_completed(&self) -> bool {
        matches!(self, GameEvent::RoundCompleted { .. })
    }
}

impl From<GameEvent> for ServerMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::GameStarted { snapshot } => ServerMessage::GameStarted {
                game_state: snapshot,
            },
            GameEvent::GuessEvaluated {
                player_id,
                player_name,
                word,
                result,
                attempts,
                guessed,
            } => ServerMessage::GuessResult {
                player_id,
                player_name,
                word: word.to_uppercase(),
                result,
                attempts,
                guessed,
            },
            GameEvent::PlayerWonRound {
                player_id,
                player_name,
                points,
                attempts,
                total_score,
            } => ServerMessage::PlayerWonRound {
                player_id,
                player_name,
                points,
                attempts,
                total_score,
            },
            GameEvent::RoundCompleted {
                round_number,
                secret_word,
            } => ServerMessage::RoundEnded {
                round_number,
                secret_word: secret_word.to_uppercase(),
            },
            GameEvent::NextRoundStarted { snapshot } => ServerMessage::NextRoundStarted {
                game_state: snapshot,
            },
            GameEvent::GameEnded {
                winner,
                final_scores,
            } => ServerMessage::GameEnded {
                winner,
                final_scores,
            },
        }
    }
}
