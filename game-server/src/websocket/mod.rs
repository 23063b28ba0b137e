use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use warp::ws::{Message, WebSocket};

use crate::game_manager::GameManager;
use game_types::{ClientMessage, ErrorKind, ServerMessage};

pub mod connection;
pub mod handlers;
pub mod rate_limiter;


pub use connection::ConnectionId;
pub use connection::ConnectionManager;
use handlers::MessageHandler;
use rate_limiter::RateLimiter;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Failed to reach client: {0}")]
    Closed(String),
}

pub async fn handle_connection(
    websocket: WebSocket,
    connection_manager: Arc<ConnectionManager>,
    game_manager: Arc<GameManager>,
) {
    let connection_id = ConnectionId::new();
    info!("New WebSocket connection: {}", connection_id);

    let (mut ws_sender, mut ws_receiver) = websocket.split();

    let message_receiver = connection_manager.create_connection(connection_id).await;
    let message_handler = MessageHandler::new(
        connection_id,
        connection_manager.clone(),
        game_manager.clone(),
    );

    // First thing the client hears is its own id
    if let Err(e) = connection_manager
        .send_to_connection(
            connection_id,
            ServerMessage::Welcome {
                player_id: connection_id.player_id(),
            },
        )
        .await
    {
        warn!("Failed to greet {}: {}", connection_id, e);
    }

    let incoming_handler = {
        let message_handler = message_handler.clone();
        let mut rate_limiter = RateLimiter::new();

        async move {
            while let Some(result) = ws_receiver.next().await {
                match result {
                    Ok(msg) => {
                        if let Err(e) =
                            handle_message(msg, &mut rate_limiter, &message_handler).await
                        {
                            error!("Error handling message for {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("WebSocket error for {}: {}", connection_id, e);
                        break;
                    }
                }
            }
        }
    };

    let outgoing_handler = async move {
        let mut receiver = message_receiver;

        while let Some(message) = receiver.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {:?}", e);
                    continue;
                }
            };

            if let Err(e) = ws_sender.send(Message::text(json)).await {
                warn!("Failed to send message to {}: {:?}", connection_id, e);
                break;
            }
        }
        let _ = ws_sender.close().await;
    };

    tokio::select! {
        _ = incoming_handler => {},
        _ = outgoing_handler => {},
    }

    info!("Connection {} disconnected", connection_id);
    message_handler.handle_disconnect().await;
    connection_manager.remove_connection(connection_id).await;
}

async fn handle_message(
    msg: Message,
    rate_limiter: &mut RateLimiter,
    message_handler: &MessageHandler,
) -> Result<(), ConnectionError> {
    if !rate_limiter.check_rate_limit() {
        return Err(ConnectionError::RateLimited);
    }

    // Pings and closes are handled by warp
    let Ok(text) = msg.to_str() else {
        return Ok(());
    };

    match serde_json::from_str::<ClientMessage>(text) {
        Ok(client_message) => message_handler
            .handle_message(client_message)
            .await
            .map_err(ConnectionError::Closed),
        Err(e) => message_handler
            .send_error(&format!("Formato JSON non valido: {}", e), ErrorKind::Protocol)
            .await
            .map_err(ConnectionError::Closed),
    }
}
