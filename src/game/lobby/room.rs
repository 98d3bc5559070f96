use crate::game::core::Player;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const MAX_PLAYERS: usize = 8;

/// A room holding players between and during matches. The lobby keeps its
/// own roster records; a started Game works on a snapshot of them.
#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub players: Vec<Player>,
    pub max_players: usize,
    pub created_at: Instant,
}

impl Room {
    pub fn new(id: impl Into<String>, host: Player) -> Self {
        Self {
            id: id.into(),
            players: vec![host],
            max_players: MAX_PLAYERS,
            created_at: Instant::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn has_nickname(&self, nickname: &str) -> bool {
        self.players.iter().any(|p| p.nickname == nickname)
    }

    pub fn player_by_id(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_by_id_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id.clone(),
            players: self.players.clone(),
            max_players: self.max_players,
        }
    }
}

/// Wire view of a room sent to its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: String,
    pub players: Vec<Player>,
    pub max_players: usize,
}

/// A room as shown in the lobby list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListItem {
    pub id: String,
    pub player_count: usize,
    pub max_players: usize,
    pub has_game: bool,
    /// Seconds since the room was created
    pub created_at_secs: u64,
}
