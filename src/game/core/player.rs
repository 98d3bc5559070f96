use serde::{Deserialize, Serialize};

/// A participant in a room. Pure data; all game invariants are
/// enforced by [`super::Game`] or the lobby layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub nickname: String,
    pub score: f64,
    pub is_host: bool,
    pub connected: bool,
}

impl Player {
    pub fn new(nickname: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            nickname: nickname.to_string(),
            score: 0.0,
            is_host: false,
            connected: true,
        }
    }

    /// Add points to the cumulative score. Negative deltas are allowed.
    pub fn update_score(&mut self, delta: f64) {
        self.score += delta;
    }

    pub fn reset_score(&mut self) {
        self.score = 0.0;
    }

    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Identity and score survive a reconnect; the lobby layer rebinds
    /// the transport channel separately.
    pub fn reconnect(&mut self) {
        self.connected = true;
    }
}
