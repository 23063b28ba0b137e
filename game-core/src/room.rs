use chrono::{DateTime, Duration, Utc};
use game_types::{
    PlayerId, ROOM_CODE_LENGTH, RoomCode, RoomSettings, RosterEntry, SessionId, SessionStatus,
};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{GameError, GameEvent, GameSession, WordSource};

pub const MAX_NAME_LENGTH: usize = 20;
pub const DEFAULT_PLAYER_NAME: &str = "Giocatore";
pub const MAX_ROUNDS: u32 = 10;
pub const MAX_PLAYERS_LIMIT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,
}

/// A lobby plus, once started, its game session.
#[derive(Debug)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub members: Vec<RoomMember>,
    pub settings: RoomSettings,
    pub session: Option<GameSession>,
    pub last_activity: DateTime<Utc>,
}

impl Room {
    fn new(code: RoomCode, host: RoomMember, settings: RoomSettings, now: DateTime<Utc>) -> Self {
        Self {
            code,
            host_id: host.id,
            members: vec![host],
            settings,
            session: None,
            last_activity: now,
        }
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.members
            .iter()
            .map(|m| RosterEntry {
                id: m.id,
                name: m.name.clone(),
                is_ready: m.is_ready,
                is_host: m.id == self.host_id,
            })
            .collect()
    }

    /// Waiting until a session exists, then whatever the session says.
    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map_or(SessionStatus::Waiting, GameSession::status)
    }

    pub fn is_host(&self, player_id: PlayerId) -> bool {
        self.host_id == player_id
    }

    pub fn player_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, player_id: PlayerId) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.id == player_id)
    }

    pub fn is_idle(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity > threshold
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }
}

/// A round that just completed and should advance after the reveal delay.
/// Carries enough identity to ignore it if the room moved on meanwhile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAdvance {
    pub room_code: RoomCode,
    pub session_id: SessionId,
    pub round_number: u32,
}

#[derive(Debug)]
pub struct GuessOutcome {
    pub room_code: RoomCode,
    pub events: Vec<GameEvent>,
    pub pending_advance: Option<PendingAdvance>,
}

#[derive(Debug)]
pub struct LeaveOutcome {
    pub room_code: RoomCode,
    pub player_name: String,
    pub new_host: Option<PlayerId>,
    pub room_removed: bool,
    pub roster: Vec<RosterEntry>,
    pub events: Vec<GameEvent>,
    pub pending_advance: Option<PendingAdvance>,
}

/// Owns every room and the player -> room index.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    player_rooms: HashMap<PlayerId, RoomCode>,
    words: Arc<dyn WordSource>,
    default_settings: RoomSettings,
}

impl RoomRegistry {
    pub fn new(words: Arc<dyn WordSource>) -> Self {
        Self::with_default_settings(words, RoomSettings::default())
    }

    pub fn with_default_settings(words: Arc<dyn WordSource>, default_settings: RoomSettings) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            words,
            default_settings: clamp_settings(default_settings),
        }
    }

    pub fn create_room(
        &mut self,
        player_id: PlayerId,
        player_name: &str,
        rounds: Option<u32>,
        max_players: Option<usize>,
        now: DateTime<Utc>,
    ) -> Result<&Room, GameError> {
        if self.player_rooms.contains_key(&player_id) {
            return Err(GameError::AlreadyInRoom);
        }

        let settings = clamp_settings(RoomSettings {
            rounds: rounds.unwrap_or(self.default_settings.rounds),
            max_players: max_players.unwrap_or(self.default_settings.max_players),
        });
        let code = self.generate_code();
        let host = RoomMember {
            id: player_id,
            name: sanitize_name(player_name),
            is_ready: false,
        };

        info!(
            "Room {} created by {} ({} rounds, max {} players)",
            code, host.name, settings.rounds, settings.max_players
        );

        self.player_rooms.insert(player_id, code.clone());
        let room = self
            .rooms
            .entry(code)
            .or_insert_with_key(|code| Room::new(code.clone(), host, settings, now));
        Ok(room)
    }

    pub fn join_room(
        &mut self,
        player_id: PlayerId,
        raw_code: &str,
        player_name: &str,
        now: DateTime<Utc>,
    ) -> Result<&Room, GameError> {
        let code = RoomCode::parse(raw_code).ok_or_else(|| GameError::InvalidRoomCode {
            code: raw_code.to_string(),
        })?;

        match self.player_rooms.get(&player_id) {
            Some(current) if *current == code => {
                return self
                    .rooms
                    .get(&code)
                    .ok_or(GameError::RoomNotFound { code });
            }
            Some(_) => return Err(GameError::AlreadyInRoom),
            None => {}
        }

        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| GameError::RoomNotFound { code: code.clone() })?;

        if room.status() == SessionStatus::Playing {
            return Err(GameError::GameAlreadyStarted);
        }
        if room.members.len() >= room.settings.max_players {
            return Err(GameError::RoomFull);
        }

        let member = RoomMember {
            id: player_id,
            name: sanitize_name(player_name),
            is_ready: false,
        };
        info!("{} joined room {}", member.name, code);
        room.members.push(member);
        room.touch(now);

        self.player_rooms.insert(player_id, code);
        Ok(room)
    }

    pub fn leave_room(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<LeaveOutcome, GameError> {
        let code = self
            .player_rooms
            .remove(&player_id)
            .ok_or(GameError::PlayerNotFound)?;
        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| GameError::RoomNotFound { code: code.clone() })?;

        let index = room
            .members
            .iter()
            .position(|m| m.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        let member = room.members.remove(index);
        room.touch(now);

        if room.members.is_empty() {
            self.rooms.remove(&code);
            info!("{} left room {}, room removed", member.name, code);
            return Ok(LeaveOutcome {
                room_code: code,
                player_name: member.name,
                new_host: None,
                room_removed: true,
                roster: Vec::new(),
                events: Vec::new(),
                pending_advance: None,
            });
        }

        let new_host = if room.host_id == player_id {
            room.host_id = room.members[0].id;
            Some(room.host_id)
        } else {
            None
        };

        let mut events = Vec::new();
        let mut pending_advance = None;
        if let Some(session) = room.session.as_mut() {
            if session.status() == SessionStatus::Playing && session.player(player_id).is_some() {
                events = session.remove_player(player_id)?;
                pending_advance = pending_from(session, &events);
            }
        }

        info!("{} left room {}", member.name, code);
        Ok(LeaveOutcome {
            room_code: code,
            player_name: member.name,
            new_host,
            room_removed: false,
            roster: room.roster(),
            events,
            pending_advance,
        })
    }

    pub fn set_ready(
        &mut self,
        player_id: PlayerId,
        is_ready: bool,
        now: DateTime<Utc>,
    ) -> Result<&Room, GameError> {
        let room = self.room_of_mut(player_id)?;
        if room.status() == SessionStatus::Playing {
            return Err(GameError::GameAlreadyStarted);
        }
        let member = room
            .members
            .iter_mut()
            .find(|m| m.id == player_id)
            .ok_or(GameError::PlayerNotFound)?;
        member.is_ready = is_ready;
        room.touch(now);
        Ok(room)
    }

    /// Host only. Every other member must be ready. A finished game can be
    /// restarted, which starts a brand new session with zeroed scores.
    pub fn start_game(
        &mut self,
        player_id: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<&GameSession, GameError> {
        let words = Arc::clone(&self.words);
        let room = self.room_of_mut(player_id)?;

        if !room.is_host(player_id) {
            return Err(GameError::NotHost);
        }
        if room.status() == SessionStatus::Playing {
            return Err(GameError::GameAlreadyStarted);
        }
        if room
            .members
            .iter()
            .any(|m| m.id != room.host_id && !m.is_ready)
        {
            return Err(GameError::NotAllReady);
        }

        let roster = room.members.iter().map(|m| (m.id, m.name.clone()));
        let session = GameSession::start(
            room.code.clone(),
            roster,
            room.settings.rounds,
            words.as_ref(),
            now,
        )?;
        room.touch(now);
        Ok(room.session.insert(session))
    }

    pub fn submit_guess(
        &mut self,
        player_id: PlayerId,
        word: &str,
        now: DateTime<Utc>,
    ) -> Result<GuessOutcome, GameError> {
        let words = Arc::clone(&self.words);
        let room = self.room_of_mut(player_id)?;
        let session = room.session.as_mut().ok_or(GameError::GameNotInProgress)?;

        let events = session.submit_guess(player_id, word, words.as_ref(), now)?;
        let pending_advance = pending_from(session, &events);
        room.touch(now);

        Ok(GuessOutcome {
            room_code: room.code.clone(),
            events,
            pending_advance,
        })
    }

    /// Fire a deferred advance. Returns `Ok(None)` when the room, session or
    /// round it was scheduled for no longer exists.
    pub fn advance_round(
        &mut self,
        code: &RoomCode,
        session_id: SessionId,
        round_number: u32,
        now: DateTime<Utc>,
    ) -> Result<Option<GameEvent>, GameError> {
        let words = Arc::clone(&self.words);
        let Some(room) = self.rooms.get_mut(code) else {
            debug!("Skipping advance for removed room {}", code);
            return Ok(None);
        };
        let Some(session) = room.session.as_mut() else {
            return Ok(None);
        };
        if session.id() != session_id
            || session.round().number() != round_number
            || !session.is_round_complete()
            || session.status() != SessionStatus::Playing
        {
            debug!(
                "Skipping stale advance for room {} round {}",
                code, round_number
            );
            return Ok(None);
        }

        let event = session.advance_round(words.as_ref(), now)?;
        if matches!(event, GameEvent::GameEnded { .. }) {
            for member in &mut room.members {
                member.is_ready = false;
            }
        }
        room.touch(now);
        Ok(Some(event))
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_of(&self, player_id: PlayerId) -> Option<&Room> {
        self.player_rooms
            .get(&player_id)
            .and_then(|code| self.rooms.get(code))
    }

    fn room_of_mut(&mut self, player_id: PlayerId) -> Result<&mut Room, GameError> {
        let code = self
            .player_rooms
            .get(&player_id)
            .ok_or(GameError::PlayerNotFound)?;
        self.rooms
            .get_mut(code)
            .ok_or_else(|| GameError::RoomNotFound { code: code.clone() })
    }

    /// Drop a room and everyone's membership in it.
    pub fn remove_room(&mut self, code: &RoomCode) -> Option<Room> {
        let room = self.rooms.remove(code)?;
        for member in &room.members {
            self.player_rooms.remove(&member.id);
        }
        Some(room)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn player_count(&self) -> usize {
        self.player_rooms.len()
    }

    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::thread_rng();
        loop {
            let raw: String = (0..ROOM_CODE_LENGTH)
                .map(|_| char::from(rng.gen_range(b'A'..=b'Z')))
                .collect();
            if let Some(code) = RoomCode::parse(&raw) {
                if !self.rooms.contains_key(&code) {
                    return code;
                }
            }
        }
    }
}

fn pending_from(session: &GameSession, events: &[GameEvent]) -> Option<PendingAdvance> {
    events
        .iter()
        .any(GameEvent::is_round_completed)
        .then(|| PendingAdvance {
            room_code: session.room_code().clone(),
            session_id: session.id(),
            round_number: session.round().number(),
        })
}

/// Trimmed, capped to `MAX_NAME_LENGTH` characters, never empty.
pub fn sanitize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_LENGTH).collect();
    let name = name.trim_end().to_string();
    if name.is_empty() {
        DEFAULT_PLAYER_NAME.to_string()
    } else {
        name
    }
}

fn clamp_settings(settings: RoomSettings) -> RoomSettings {
    RoomSettings {
        max_players: settings.max_players.clamp(1, MAX_PLAYERS_LIMIT),
        rounds: settings.rounds.clamp(1, MAX_ROUNDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordList;
    use uuid::Uuid;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(WordList::from_word_list("gatto").unwrap()))
    }

    fn new_room(registry: &mut RoomRegistry, host: PlayerId) -> RoomCode {
        registry
            .create_room(host, "Anna", None, None, Utc::now())
            .unwrap()
            .code
            .clone()
    }

    #[test]
    fn test_create_room_defaults() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let room = registry
            .create_room(host, "  Anna  ", None, None, Utc::now())
            .unwrap();

        assert_eq!(room.code.as_str().len(), ROOM_CODE_LENGTH);
        assert_eq!(room.settings, RoomSettings::default());
        assert_eq!(room.members[0].name, "Anna");
        assert!(room.is_host(host));
        assert_eq!(room.status(), SessionStatus::Waiting);
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.player_count(), 1);
    }

    #[test]
    fn test_create_room_clamps_settings() {
        let mut registry = registry();
        let room = registry
            .create_room(Uuid::new_v4(), "Anna", Some(99), Some(0), Utc::now())
            .unwrap();
        assert_eq!(room.settings.rounds, MAX_ROUNDS);
        assert_eq!(room.settings.max_players, 1);
    }

    #[test]
    fn test_cannot_create_twice() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        new_room(&mut registry, host);
        assert!(matches!(
            registry.create_room(host, "Anna", None, None, Utc::now()),
            Err(GameError::AlreadyInRoom)
        ));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("   "), DEFAULT_PLAYER_NAME);
        assert_eq!(sanitize_name(" Bruno "), "Bruno");
        assert_eq!(
            sanitize_name("abcdefghijklmnopqrstuvwxyz").chars().count(),
            MAX_NAME_LENGTH
        );
    }

    #[test]
    fn test_join_room_lowercase_code() {
        let mut registry = registry();
        let code = new_room(&mut registry, Uuid::new_v4());
        let guest = Uuid::new_v4();

        let room = registry
            .join_room(guest, &code.as_str().to_lowercase(), "Bruno", Utc::now())
            .unwrap();
        assert_eq!(room.player_count(), 2);
        assert!(!room.is_host(guest));
        assert_eq!(registry.room_of(guest).unwrap().code, code);
    }

    #[test]
    fn test_join_errors() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let code = new_room(&mut registry, host);

        assert!(matches!(
            registry.join_room(Uuid::new_v4(), "AB1", "Bruno", Utc::now()),
            Err(GameError::InvalidRoomCode { .. })
        ));
        let missing = if code.as_str() == "ZZZZ" { "YYYY" } else { "ZZZZ" };
        assert!(matches!(
            registry.join_room(Uuid::new_v4(), missing, "Bruno", Utc::now()),
            Err(GameError::RoomNotFound { .. })
        ));

        // Rejoining the same room is a no-op
        let room = registry
            .join_room(host, code.as_str(), "Anna", Utc::now())
            .unwrap();
        assert_eq!(room.player_count(), 1);
    }

    #[test]
    fn test_join_full_room() {
        let mut registry = registry();
        let code = registry
            .create_room(Uuid::new_v4(), "Anna", None, Some(2), Utc::now())
            .unwrap()
            .code
            .clone();
        registry
            .join_room(Uuid::new_v4(), code.as_str(), "Bruno", Utc::now())
            .unwrap();
        assert!(matches!(
            registry.join_room(Uuid::new_v4(), code.as_str(), "Carla", Utc::now()),
            Err(GameError::RoomFull)
        ));
    }

    #[test]
    fn test_join_started_game() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let code = new_room(&mut registry, host);
        registry.start_game(host, Utc::now()).unwrap();

        assert!(matches!(
            registry.join_room(Uuid::new_v4(), code.as_str(), "Bruno", Utc::now()),
            Err(GameError::GameAlreadyStarted)
        ));
    }

    #[test]
    fn test_start_game_rules() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = new_room(&mut registry, host);
        registry
            .join_room(guest, code.as_str(), "Bruno", Utc::now())
            .unwrap();

        assert!(matches!(
            registry.start_game(guest, Utc::now()),
            Err(GameError::NotHost)
        ));
        assert!(matches!(
            registry.start_game(host, Utc::now()),
            Err(GameError::NotAllReady)
        ));

        registry.set_ready(guest, true, Utc::now()).unwrap();
        let session = registry.start_game(host, Utc::now()).unwrap();
        assert_eq!(session.players().len(), 2);
        assert_eq!(session.status(), SessionStatus::Playing);

        assert!(matches!(
            registry.start_game(host, Utc::now()),
            Err(GameError::GameAlreadyStarted)
        ));
    }

    #[test]
    fn test_host_leaves_hands_off() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = new_room(&mut registry, host);
        registry
            .join_room(guest, code.as_str(), "Bruno", Utc::now())
            .unwrap();

        let outcome = registry.leave_room(host, Utc::now()).unwrap();
        assert_eq!(outcome.new_host, Some(guest));
        assert!(!outcome.room_removed);
        assert_eq!(outcome.roster.len(), 1);
        assert!(outcome.roster[0].is_host);
        assert!(registry.room_of(host).is_none());
    }

    #[test]
    fn test_last_leave_removes_room() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let code = new_room(&mut registry, host);

        let outcome = registry.leave_room(host, Utc::now()).unwrap();
        assert!(outcome.room_removed);
        assert!(registry.room(&code).is_none());
        assert_eq!(registry.room_count(), 0);
        assert!(matches!(
            registry.leave_room(host, Utc::now()),
            Err(GameError::PlayerNotFound)
        ));
    }

    #[test]
    fn test_guess_flow_and_stale_advance() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let code = new_room(&mut registry, host);
        let now = Utc::now();
        let session_id = registry.start_game(host, now).unwrap().id();

        let outcome = registry.submit_guess(host, "gatto", now).unwrap();
        let pending = outcome.pending_advance.unwrap();
        assert_eq!(pending.round_number, 1);
        assert_eq!(pending.session_id, session_id);

        // Wrong round is ignored
        assert_eq!(registry.advance_round(&code, session_id, 2, now), Ok(None));
        let event = registry
            .advance_round(&code, session_id, 1, now)
            .unwrap()
            .unwrap();
        assert!(matches!(event, GameEvent::NextRoundStarted { .. }));

        // Same timer firing twice does nothing
        assert_eq!(registry.advance_round(&code, session_id, 1, now), Ok(None));
    }

    #[test]
    fn test_game_end_resets_ready() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = registry
            .create_room(host, "Anna", Some(1), None, Utc::now())
            .unwrap()
            .code
            .clone();
        registry
            .join_room(guest, code.as_str(), "Bruno", Utc::now())
            .unwrap();
        registry.set_ready(guest, true, Utc::now()).unwrap();
        let session_id = registry.start_game(host, Utc::now()).unwrap().id();

        registry.submit_guess(host, "gatto", Utc::now()).unwrap();
        let outcome = registry.submit_guess(guest, "gatto", Utc::now()).unwrap();
        assert!(outcome.pending_advance.is_some());

        let event = registry
            .advance_round(&code, session_id, 1, Utc::now())
            .unwrap()
            .unwrap();
        assert!(matches!(event, GameEvent::GameEnded { .. }));

        let room = registry.room(&code).unwrap();
        assert_eq!(room.status(), SessionStatus::Finished);
        assert!(room.members.iter().all(|m| !m.is_ready));
    }

    #[test]
    fn test_leave_mid_round_completes_it() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let guest = Uuid::new_v4();
        let code = new_room(&mut registry, host);
        registry
            .join_room(guest, code.as_str(), "Bruno", Utc::now())
            .unwrap();
        registry.set_ready(guest, true, Utc::now()).unwrap();
        registry.start_game(host, Utc::now()).unwrap();

        registry.submit_guess(host, "gatto", Utc::now()).unwrap();
        let outcome = registry.leave_room(guest, Utc::now()).unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert!(outcome.pending_advance.is_some());
    }

    #[test]
    fn test_remove_room_clears_memberships() {
        let mut registry = registry();
        let host = Uuid::new_v4();
        let code = new_room(&mut registry, host);

        assert!(registry.remove_room(&code).is_some());
        assert!(registry.room_of(host).is_none());
        assert_eq!(registry.player_count(), 0);
    }
}
