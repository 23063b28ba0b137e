pub mod cleanup;
pub mod errors;
pub mod evaluation;
pub mod game_events;
pub mod game_state;
pub mod room;
pub mod scoring;
pub mod word_source;

// Re-export main components
pub use cleanup::*;
pub use errors::*;
pub use evaluation::*;
pub use game_events::*;
pub use game_state::*;
pub use room::*;
pub use scoring::*;
pub use word_source::*;
