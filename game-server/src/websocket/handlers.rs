use std::sync::Arc;
use tracing::{debug, info};

use crate::game_manager::GameManager;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use game_core::GameError;
use game_types::{ClientMessage, ErrorKind, ServerMessage};

#[derive(Clone)]
pub struct MessageHandler {
    connection_id: ConnectionId,
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
}

impl MessageHandler {
    pub fn new(
        connection_id: ConnectionId,
        connection_manager: Arc<ConnectionManager>,
        game_manager: Arc<GameManager>,
    ) -> Self {
        Self {
            connection_id,
            connection_manager,
            game_manager,
        }
    }

    /// Game errors go back to this connection only. An `Err` here means the
    /// connection itself is broken.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), String> {
        self.connection_manager
            .update_activity(self.connection_id)
            .await;

        let result = match message {
            ClientMessage::CreateRoom {
                player_name,
                rounds,
                max_players,
            } => {
                self.handle_create_room(player_name, rounds, max_players)
                    .await
            }
            ClientMessage::JoinRoom {
                room_code,
                player_name,
            } => self.handle_join_room(room_code, player_name).await,
            ClientMessage::PlayerReady { is_ready } => self.handle_player_ready(is_ready).await,
            ClientMessage::StartGame => self.handle_start_game().await,
            ClientMessage::MakeGuess { word } => self.handle_make_guess(word).await,
            ClientMessage::SkipTurn => self.game_manager.skip_turn(self.connection_id).await,
            ClientMessage::LeaveRoom => self.handle_leave_room().await,
            ClientMessage::ChatMessage { message } => {
                self.game_manager
                    .relay_chat(self.connection_id, &message)
                    .await
            }
            ClientMessage::Heartbeat => Ok(()),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!("Rejected request from {}: {}", self.connection_id, e);
                self.send_game_error(&e).await
            }
        }
    }

    pub async fn handle_disconnect(&self) {
        info!("Handling disconnect for connection {}", self.connection_id);
        self.game_manager.handle_disconnect(self.connection_id).await;
    }

    async fn handle_create_room(
        &self,
        player_name: String,
        rounds: Option<u32>,
        max_players: Option<usize>,
    ) -> Result<(), GameError> {
        info!("Player {} creating a room", self.connection_id);
        self.game_manager
            .create_room(self.connection_id, &player_name, rounds, max_players)
            .await
    }

    async fn handle_join_room(&self, room_code: String, player_name: String) -> Result<(), GameError> {
        info!("Player {} joining room {}", self.connection_id, room_code);
        self.game_manager
            .join_room(self.connection_id, &room_code, &player_name)
            .await
    }

    async fn handle_player_ready(&self, is_ready: bool) -> Result<(), GameError> {
        self.game_manager
            .set_ready(self.connection_id, is_ready)
            .await
    }

    async fn handle_start_game(&self) -> Result<(), GameError> {
        info!("Player {} starting the game", self.connection_id);
        self.game_manager.start_game(self.connection_id).await
    }

    async fn handle_make_guess(&self, word: String) -> Result<(), GameError> {
        debug!("Player {} guessing {}", self.connection_id, word);
        self.game_manager
            .submit_guess(self.connection_id, &word)
            .await
    }

    async fn handle_leave_room(&self) -> Result<(), GameError> {
        info!("Player {} leaving room", self.connection_id);
        self.game_manager.leave_room(self.connection_id).await
    }

    async fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.connection_manager
            .send_to_connection(self.connection_id, message)
            .await
    }

    async fn send_game_error(&self, error: &GameError) -> Result<(), String> {
        self.send_error(&error.to_string(), error.kind()).await
    }

    pub async fn send_error(&self, message: &str, kind: ErrorKind) -> Result<(), String> {
        self.send_message(ServerMessage::Error {
            message: message.to_string(),
            kind,
        })
        .await
    }
}
