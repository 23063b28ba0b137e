use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
    pub is_host: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomSettings {
    pub max_players: usize,
    pub rounds: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_players: 4,
            rounds: 3,
        }
    }
}
