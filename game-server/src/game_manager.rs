use chrono::Utc;
use game_core::{GameError, GameEvent, PendingAdvance, RoomCleanup, RoomRegistry, WordSource};
use game_types::{RoomCode, RoomSettings, ServerMessage, SessionStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::websocket::connection::{ConnectionId, ConnectionManager};

pub const MAX_CHAT_LENGTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    #[serde(rename = "playersOnline")]
    pub connected_clients: usize,
    pub players_in_rooms: usize,
    pub active_rooms: usize,
}

/// Async front for the room registry. Every mutation, and the broadcast of
/// its result, happens under the registry write lock so clients see events
/// in the order they were applied.
pub struct GameManager {
    registry: RwLock<RoomRegistry>,
    connection_manager: Arc<ConnectionManager>,
    reveal_delay: Duration,
    pending_advances: Mutex<HashMap<RoomCode, (PendingAdvance, AbortHandle)>>,
}

impl GameManager {
    pub fn new(
        connection_manager: Arc<ConnectionManager>,
        words: Arc<dyn WordSource>,
        default_settings: RoomSettings,
        reveal_delay: Duration,
    ) -> Self {
        Self {
            registry: RwLock::new(RoomRegistry::with_default_settings(words, default_settings)),
            connection_manager,
            reveal_delay,
            pending_advances: Mutex::new(HashMap::new()),
        }
    }

    pub async fn create_room(
        &self,
        connection_id: ConnectionId,
        player_name: &str,
        rounds: Option<u32>,
        max_players: Option<usize>,
    ) -> Result<(), GameError> {
        let mut registry = self.registry.write().await;
        let room = registry.create_room(
            connection_id.player_id(),
            player_name,
            rounds,
            max_players,
            Utc::now(),
        )?;
        let message = ServerMessage::RoomCreated {
            room_code: room.code.clone(),
            is_host: true,
            settings: room.settings,
            roster: room.roster(),
        };

        self.connection_manager
            .set_connection_room(connection_id, Some(room.code.clone()))
            .await;
        self.send_to(connection_id, message).await;
        Ok(())
    }

    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_code: &str,
        player_name: &str,
    ) -> Result<(), GameError> {
        let player_id = connection_id.player_id();
        let mut registry = self.registry.write().await;
        let room = registry.join_room(player_id, room_code, player_name, Utc::now())?;
        let code = room.code.clone();
        let roster = room.roster();
        let name = room
            .member(player_id)
            .map(|m| m.name.clone())
            .unwrap_or_default();

        let joined = ServerMessage::RoomJoined {
            room_code: code.clone(),
            is_host: room.is_host(player_id),
            settings: room.settings,
            roster: roster.clone(),
        };
        let announcement = ServerMessage::PlayerJoined {
            player_id,
            player_name: name,
            roster,
        };

        self.connection_manager
            .set_connection_room(connection_id, Some(code.clone()))
            .await;
        self.send_to(connection_id, joined).await;
        self.connection_manager
            .send_to_room_except(&code, connection_id, announcement)
            .await;
        Ok(())
    }

    pub async fn leave_room(self: &Arc<Self>, connection_id: ConnectionId) -> Result<(), GameError> {
        let player_id = connection_id.player_id();
        let mut registry = self.registry.write().await;
        let outcome = registry.leave_room(player_id, Utc::now())?;

        self.connection_manager
            .set_connection_room(connection_id, None)
            .await;
        // The socket may already be gone when this runs on disconnect
        let _ = self
            .connection_manager
            .send_to_connection(connection_id, ServerMessage::RoomLeft)
            .await;

        if outcome.room_removed {
            drop(registry);
            self.cancel_pending_advance(&outcome.room_code).await;
            return Ok(());
        }

        self.connection_manager
            .send_to_room(
                &outcome.room_code,
                ServerMessage::PlayerLeft {
                    player_id,
                    player_name: outcome.player_name,
                    new_host: outcome.new_host,
                    roster: outcome.roster,
                },
            )
            .await;
        self.broadcast_events(&outcome.room_code, outcome.events).await;
        drop(registry);

        if let Some(pending) = outcome.pending_advance {
            self.schedule_round_advance(pending).await;
        }
        Ok(())
    }

    pub async fn set_ready(
        &self,
        connection_id: ConnectionId,
        is_ready: bool,
    ) -> Result<(), GameError> {
        let player_id = connection_id.player_id();
        let mut registry = self.registry.write().await;
        let room = registry.set_ready(player_id, is_ready, Utc::now())?;
        let roster = room.roster();

        self.connection_manager
            .send_to_room(
                &room.code,
                ServerMessage::PlayerReadyUpdated {
                    player_id,
                    is_ready,
                    roster,
                },
            )
            .await;
        Ok(())
    }

    pub async fn start_game(&self, connection_id: ConnectionId) -> Result<(), GameError> {
        let mut registry = self.registry.write().await;
        let session = registry.start_game(connection_id.player_id(), Utc::now())?;
        let event = GameEvent::GameStarted {
            snapshot: session.snapshot(),
        };

        self.broadcast_events(session.room_code(), vec![event]).await;
        Ok(())
    }

    pub async fn submit_guess(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        word: &str,
    ) -> Result<(), GameError> {
        let mut registry = self.registry.write().await;
        let outcome = registry.submit_guess(connection_id.player_id(), word, Utc::now())?;
        self.broadcast_events(&outcome.room_code, outcome.events).await;
        drop(registry);

        if let Some(pending) = outcome.pending_advance {
            self.schedule_round_advance(pending).await;
        }
        Ok(())
    }

    /// Relayed to the whole room, sender included. Blank messages are dropped.
    pub async fn relay_chat(
        &self,
        connection_id: ConnectionId,
        message: &str,
    ) -> Result<(), GameError> {
        let message: String = message.trim().chars().take(MAX_CHAT_LENGTH).collect();
        if message.is_empty() {
            return Ok(());
        }

        let player_id = connection_id.player_id();
        let registry = self.registry.read().await;
        let (code, player_name) = member_of_room(&registry, connection_id)?;
        self.connection_manager
            .send_to_room(
                &code,
                ServerMessage::ChatMessage {
                    player_id,
                    player_name,
                    message,
                    timestamp: Utc::now().to_rfc3339(),
                },
            )
            .await;
        Ok(())
    }

    /// Guessing is simultaneous, so a skip only tells the others.
    pub async fn skip_turn(&self, connection_id: ConnectionId) -> Result<(), GameError> {
        let registry = self.registry.read().await;
        let (code, player_name) = member_of_room(&registry, connection_id)?;
        let playing = registry
            .room(&code)
            .is_some_and(|room| room.status() == SessionStatus::Playing);
        if !playing {
            return Err(GameError::GameNotInProgress);
        }

        self.connection_manager
            .send_to_room(
                &code,
                ServerMessage::TurnSkipped {
                    player_id: connection_id.player_id(),
                    player_name,
                },
            )
            .await;
        Ok(())
    }

    /// Leave whatever room the player was in. Not being in one is fine.
    pub async fn handle_disconnect(self: &Arc<Self>, connection_id: ConnectionId) {
        match self.leave_room(connection_id).await {
            Ok(()) | Err(GameError::PlayerNotFound) => {}
            Err(e) => warn!("Failed to remove {} from its room: {}", connection_id, e),
        }
    }

    /// Spawn the delayed advance for a just-completed round. Replaces any
    /// earlier timer for the same room.
    pub async fn schedule_round_advance(self: &Arc<Self>, pending: PendingAdvance) {
        let manager = Arc::clone(self);
        let task_pending = pending.clone();
        let delay = self.reveal_delay;

        // The entry must exist before the task can fire
        let mut pending_advances = self.pending_advances.lock().await;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.fire_round_advance(task_pending).await;
        });

        if let Some((_, old)) = pending_advances.insert(
            pending.room_code.clone(),
            (pending, handle.abort_handle()),
        ) {
            old.abort();
        }
    }

    async fn fire_round_advance(&self, pending: PendingAdvance) {
        {
            let mut pending_advances = self.pending_advances.lock().await;
            if pending_advances
                .get(&pending.room_code)
                .is_some_and(|(scheduled, _)| *scheduled == pending)
            {
                pending_advances.remove(&pending.room_code);
            }
        }

        let mut registry = self.registry.write().await;
        let result = registry.advance_round(
            &pending.room_code,
            pending.session_id,
            pending.round_number,
            Utc::now(),
        );

        match result {
            Ok(Some(event)) => self.broadcast_events(&pending.room_code, vec![event]).await,
            Ok(None) => debug!(
                "Round advance for room {} round {} no longer applies",
                pending.room_code, pending.round_number
            ),
            Err(e) => warn!(
                "Failed to advance round in room {}: {}",
                pending.room_code, e
            ),
        }
    }

    async fn cancel_pending_advance(&self, code: &RoomCode) {
        if let Some((_, handle)) = self.pending_advances.lock().await.remove(code) {
            debug!("Cancelled pending round advance for room {}", code);
            handle.abort();
        }
    }

    pub async fn pending_advance_count(&self) -> usize {
        self.pending_advances.lock().await.len()
    }

    /// Remove rooms idle for longer than `idle_threshold`.
    pub async fn cleanup_idle_rooms(&self, idle_threshold: Duration) -> Vec<RoomCode> {
        let threshold = chrono::Duration::from_std(idle_threshold)
            .unwrap_or_else(|_| chrono::Duration::minutes(60));
        let removed = {
            let mut registry = self.registry.write().await;
            RoomCleanup::new(threshold).cleanup_idle_rooms(&mut registry, Utc::now())
        };

        for code in &removed {
            self.cancel_pending_advance(code).await;
            self.connection_manager.clear_room(code).await;
        }
        if !removed.is_empty() {
            info!("Cleaned up {} idle rooms", removed.len());
        }
        removed
    }

    pub async fn stats(&self) -> ServerStats {
        let (players_in_rooms, active_rooms) = {
            let registry = self.registry.read().await;
            (registry.player_count(), registry.room_count())
        };
        ServerStats {
            connected_clients: self.connection_manager.connection_count().await,
            players_in_rooms,
            active_rooms,
        }
    }

    pub async fn room_status(&self, code: &RoomCode) -> Option<SessionStatus> {
        self.registry.read().await.room(code).map(|room| room.status())
    }

    pub async fn current_round(&self, code: &RoomCode) -> Option<u32> {
        let registry = self.registry.read().await;
        registry
            .room(code)
            .and_then(|room| room.session.as_ref())
            .map(|session| session.round().number())
    }

    async fn broadcast_events(&self, code: &RoomCode, events: Vec<GameEvent>) {
        for event in events {
            self.connection_manager
                .send_to_room(code, ServerMessage::from(event))
                .await;
        }
    }

    async fn send_to(&self, connection_id: ConnectionId, message: ServerMessage) {
        if let Err(e) = self
            .connection_manager
            .send_to_connection(connection_id, message)
            .await
        {
            warn!("Failed to send message to {}: {}", connection_id, e);
        }
    }
}

fn member_of_room(
    registry: &RoomRegistry,
    connection_id: ConnectionId,
) -> Result<(RoomCode, String), GameError> {
    let player_id = connection_id.player_id();
    let room = registry.room_of(player_id).ok_or(GameError::PlayerNotFound)?;
    let member = room.member(player_id).ok_or(GameError::PlayerNotFound)?;
    Ok((room.code.clone(), member.name.clone()))
}
