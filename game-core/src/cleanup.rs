use chrono::{DateTime, Duration, Utc};
use game_types::RoomCode;
use tracing::info;

use crate::{Room, RoomRegistry};

pub struct RoomCleanup {
    pub idle_threshold: Duration, // no activity at all
}

impl Default for RoomCleanup {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::minutes(60),
        }
    }
}

impl RoomCleanup {
    pub fn new(idle_threshold: Duration) -> Self {
        Self { idle_threshold }
    }

    /// Remove rooms nobody has touched within the threshold.
    pub fn cleanup_idle_rooms(
        &self,
        registry: &mut RoomRegistry,
        now: DateTime<Utc>,
    ) -> Vec<RoomCode> {
        let stale: Vec<RoomCode> = registry
            .rooms()
            .filter(|room| self.should_cleanup(room, now))
            .map(|room| room.code.clone())
            .collect();

        for code in &stale {
            if let Some(room) = registry.remove_room(code) {
                info!(
                    "Removed idle room {} ({} players, last activity {})",
                    code,
                    room.player_count(),
                    room.last_activity
                );
            }
        }

        stale
    }

    pub fn should_cleanup(&self, room: &Room, now: DateTime<Utc>) -> bool {
        room.members.is_empty() || room.is_idle(self.idle_threshold, now)
    }
}
