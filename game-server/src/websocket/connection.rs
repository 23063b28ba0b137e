use game_types::{PlayerId, RoomCode, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// One socket is one player, so the connection id doubles as the player id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn player_id(&self) -> PlayerId {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub connected_at: Instant,
    pub last_activity: Instant,
    pub room_code: Option<RoomCode>,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let now = Instant::now();

        let connection = Self {
            id,
            connected_at: now,
            last_activity: now,
            room_code: None,
            sender,
        };

        (connection, receiver)
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn send_message(&self, message: ServerMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .map_err(|_| "Connection closed".to_string())
    }

    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }

    fn in_room(&self, code: &RoomCode) -> bool {
        self.room_code.as_ref() == Some(code)
    }
}

pub struct ConnectionManager {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_connection(
        &self,
        id: ConnectionId,
    ) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (conn, receiver) = Connection::new(id);
        self.connections.write().await.insert(id, conn);
        receiver
    }

    /// Dropping the connection drops its sender, which ends the socket's
    /// outgoing loop.
    pub async fn remove_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.write().await.remove(&id)
    }

    pub async fn get_connection(&self, id: ConnectionId) -> Option<Connection> {
        self.connections.read().await.get(&id).cloned()
    }

    pub async fn update_activity(&self, id: ConnectionId) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.update_activity();
        }
    }

    pub async fn set_connection_room(&self, id: ConnectionId, room_code: Option<RoomCode>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&id) {
            connection.room_code = room_code;
        }
    }

    /// Detach every connection still pointing at a room that no longer exists.
    pub async fn clear_room(&self, room_code: &RoomCode) {
        let mut connections = self.connections.write().await;
        for connection in connections.values_mut() {
            if connection.in_room(room_code) {
                connection.room_code = None;
            }
        }
    }

    pub async fn send_to_connection(
        &self,
        id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), String> {
        let connections = self.connections.read().await;
        if let Some(connection) = connections.get(&id) {
            connection.send_message(message)
        } else {
            Err("Connection not found".to_string())
        }
    }

    pub async fn send_to_room(&self, room_code: &RoomCode, message: ServerMessage) {
        let connections = self.connections.read().await;
        for connection in connections.values().filter(|c| c.in_room(room_code)) {
            let _ = connection.send_message(message.clone());
        }
    }

    pub async fn send_to_room_except(
        &self,
        room_code: &RoomCode,
        except_connection: ConnectionId,
        message: ServerMessage,
    ) {
        let connections = self.connections.read().await;
        for connection in connections
            .values()
            .filter(|c| c.id != except_connection && c.in_room(room_code))
        {
            let _ = connection.send_message(message.clone());
        }
    }

    pub async fn get_connections_in_room(&self, room_code: &RoomCode) -> Vec<ConnectionId> {
        let connections = self.connections.read().await;
        connections
            .values()
            .filter(|conn| conn.in_room(room_code))
            .map(|conn| conn.id)
            .collect()
    }

    /// Returns the ids that were dropped.
    pub async fn cleanup_inactive_connections(&self, timeout: Duration) -> Vec<ConnectionId> {
        let inactive_connections: Vec<ConnectionId> = {
            let connections = self.connections.read().await;
            connections
                .values()
                .filter(|conn| conn.is_inactive(timeout))
                .map(|conn| conn.id)
                .collect()
        };

        for connection_id in &inactive_connections {
            tracing::info!("Removing inactive connection: {}", connection_id);
            self.remove_connection(*connection_id).await;
        }

        inactive_connections
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_types::ErrorKind;

    fn error_message(text: &str) -> ServerMessage {
        ServerMessage::Error {
            message: text.to_string(),
            kind: ErrorKind::State,
        }
    }

    fn code(raw: &str) -> RoomCode {
        RoomCode::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_connection_creation_and_removal() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let _receiver = manager.create_connection(conn_id).await;
        assert_eq!(manager.connection_count().await, 1);

        assert!(manager.remove_connection(conn_id).await.is_some());
        assert_eq!(manager.connection_count().await, 0);
    }

    #[test]
    fn test_player_id_matches_connection() {
        let conn_id = ConnectionId::new();
        assert_eq!(conn_id.player_id().to_string(), conn_id.to_string());
    }

    #[tokio::test]
    async fn test_activity_tracking_and_timeout() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let _receiver = manager.create_connection(conn_id).await;

        let short_timeout = Duration::from_millis(10);
        assert!(manager.cleanup_inactive_connections(short_timeout).await.is_empty());
        assert_eq!(manager.connection_count().await, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let removed = manager.cleanup_inactive_connections(short_timeout).await;
        assert_eq!(removed, vec![conn_id]);
        assert_eq!(manager.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_message_sending_to_nonexistent_connection() {
        let manager = ConnectionManager::new();

        let result = manager
            .send_to_connection(ConnectionId::new(), error_message("test"))
            .await;

        assert_eq!(result.unwrap_err(), "Connection not found");
    }

    #[tokio::test]
    async fn test_message_sending_after_connection_close() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();

        let receiver = manager.create_connection(conn_id).await;
        drop(receiver);

        let result = manager
            .send_to_connection(conn_id, error_message("test"))
            .await;
        assert_eq!(result.unwrap_err(), "Connection closed");
    }

    #[tokio::test]
    async fn test_room_broadcast() {
        let manager = ConnectionManager::new();
        let conn_id1 = ConnectionId::new();
        let conn_id2 = ConnectionId::new();
        let outsider = ConnectionId::new();

        let mut receiver1 = manager.create_connection(conn_id1).await;
        let mut receiver2 = manager.create_connection(conn_id2).await;
        let mut receiver3 = manager.create_connection(outsider).await;

        manager.set_connection_room(conn_id1, Some(code("ABCD"))).await;
        manager.set_connection_room(conn_id2, Some(code("ABCD"))).await;
        manager.set_connection_room(outsider, Some(code("WXYZ"))).await;

        manager
            .send_to_room(&code("ABCD"), error_message("room_message"))
            .await;

        assert!(receiver1.try_recv().is_ok());
        assert!(receiver2.try_recv().is_ok());
        assert!(receiver3.try_recv().is_err());
        assert_eq!(manager.get_connections_in_room(&code("ABCD")).await.len(), 2);
    }

    #[tokio::test]
    async fn test_room_broadcast_except_sender() {
        let manager = ConnectionManager::new();
        let sender_id = ConnectionId::new();
        let other_id = ConnectionId::new();

        let mut sender_rx = manager.create_connection(sender_id).await;
        let mut other_rx = manager.create_connection(other_id).await;
        manager.set_connection_room(sender_id, Some(code("ABCD"))).await;
        manager.set_connection_room(other_id, Some(code("ABCD"))).await;

        manager
            .send_to_room_except(&code("ABCD"), sender_id, error_message("hi"))
            .await;

        assert!(sender_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_clear_room() {
        let manager = ConnectionManager::new();
        let conn_id = ConnectionId::new();
        let _receiver = manager.create_connection(conn_id).await;
        manager.set_connection_room(conn_id, Some(code("ABCD"))).await;

        manager.clear_room(&code("ABCD")).await;
        let connection = manager.get_connection(conn_id).await.unwrap();
        assert!(connection.room_code.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_connection_operations() {
        let manager = std::sync::Arc::new(ConnectionManager::new());
        let mut handles = Vec::new();

        for _ in 0..50 {
            let manager_clone = manager.clone();
            let handle = tokio::spawn(async move {
                let conn_id = ConnectionId::new();
                let _receiver = manager_clone.create_connection(conn_id).await;
                tokio::time::sleep(Duration::from_millis(1)).await;
                manager_clone
                    .set_connection_room(conn_id, Some(RoomCode::parse("ABCD").unwrap()))
                    .await;
                manager_clone.remove_connection(conn_id).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(manager.connection_count().await, 0);
    }
}
