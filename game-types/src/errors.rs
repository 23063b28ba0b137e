use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Category of a rejected request, sent alongside the human readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ErrorKind {
    Validation,    // Wrong length, not in the word list, bad room code
    Authorization, // Non-host tried a host-only action
    State,         // Action not allowed in the current game state
    NotFound,      // Unknown room or player
    Protocol,      // Malformed or unsupported message
}
