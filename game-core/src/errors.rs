use game_types::{ErrorKind, RoomCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("La parola deve essere di {expected} lettere, non {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Parola non valida: {word}")]
    NotInDictionary { word: String },
    #[error("Codice stanza non valido: {code}")]
    InvalidRoomCode { code: String },
    #[error("Solo l'host può avviare la partita")]
    NotHost,
    #[error("Non tutti i giocatori sono pronti")]
    NotAllReady,
    #[error("Hai già concluso questo round")]
    RoundAlreadyCompleteForPlayer,
    #[error("Round concluso, attendi il prossimo")]
    RoundNotAcceptingGuesses,
    #[error("Almeno {min} giocatore necessario")]
    NotEnoughPlayers { min: usize },
    #[error("Il round è ancora in corso")]
    RoundInProgress,
    #[error("Sei già in una stanza")]
    AlreadyInRoom,
    #[error("Partita già in corso")]
    GameAlreadyStarted,
    #[error("Non sei in una partita")]
    GameNotInProgress,
    #[error("Stanza piena")]
    RoomFull,
    #[error("Stanza {code} non trovata")]
    RoomNotFound { code: RoomCode },
    #[error("Non sei in una stanza")]
    PlayerNotFound,
    #[error("Lista parole vuota")]
    EmptyWordList,
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidLength { .. }
            | GameError::NotInDictionary { .. }
            | GameError::InvalidRoomCode { .. } => ErrorKind::Validation,
            GameError::NotHost => ErrorKind::Authorization,
            GameError::NotAllReady
            | GameError::NotEnoughPlayers { .. }
            | GameError::RoundInProgress
            | GameError::AlreadyInRoom
            | GameError::RoundAlreadyCompleteForPlayer
            | GameError::RoundNotAcceptingGuesses
            | GameError::GameAlreadyStarted
            | GameError::GameNotInProgress
            | GameError::RoomFull
            | GameError::EmptyWordList => ErrorKind::State,
            GameError::RoomNotFound { .. } | GameError::PlayerNotFound => ErrorKind::NotFound,
        }
    }
}
