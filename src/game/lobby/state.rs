use super::room::{Room, RoomInfo, RoomListItem};
use super::room_id::generate_unique_room_id;
use crate::game::core::{
    DEFAULT_VOTE_TIMEOUT, Game, GameError, GamePhase, GameState, Player, Topic, Vote,
    VotingRoundState,
};
use crate::game::messages::ServerMessage;
use dashmap::DashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

pub const DEFAULT_RESULTS_DELAY: Duration = Duration::from_secs(3);
const MAX_TOPIC_LENGTH: usize = 50;

#[derive(Debug, Error, PartialEq)]
pub enum LobbyError {
    #[error("room not found")]
    RoomNotFound,
    #[error("room is full")]
    RoomFull,
    #[error("nickname already taken in this room")]
    NicknameTaken,
    #[error("nickname cannot be empty")]
    EmptyNickname,
    #[error("you are not in a room")]
    NotInRoom,
    #[error("only the host can do that")]
    NotHost,
    #[error("no game is running in this room")]
    GameNotFound,
    #[error("player not found")]
    PlayerNotFound,
    #[error("topic cannot be empty")]
    EmptyTopic,
    #[error("topic too long (max {MAX_TOPIC_LENGTH} characters)")]
    TopicTooLong,
    #[error("word cannot be empty")]
    EmptyWord,
    #[error(transparent)]
    Game(#[from] GameError),
}

/// An accepted topic proposal. When this was the last missing topic the
/// word phase has already been entered and its snapshot is included.
#[derive(Debug)]
pub struct TopicAccepted {
    pub topic: Topic,
    pub game_state: GameState,
    pub word_phase: Option<GameState>,
}

pub struct WordAccepted {
    pub round: VotingRoundState,
    pub game_state: GameState,
}

pub struct VoteAccepted {
    pub vote: Vote,
    pub round_completed: bool,
    pub game_state: GameState,
}

pub struct DisconnectInfo {
    pub player: Player,
    pub room_id: String,
    pub room: Option<RoomInfo>,
}

/// Outcome of an explicit leave. `room` is None when the room emptied out
/// and was deleted; `word_phase` is set when the departure left every
/// remaining player with a topic and the game moved on to word turns.
pub struct LeaveInfo {
    pub player: Player,
    pub room: Option<RoomInfo>,
    pub room_id: String,
    pub word_phase: Option<GameState>,
}

/// Registry of rooms, running games and player transport channels.
///
/// Game mutations go through `games.get_mut`, so operations on one room's
/// game are serialized while different rooms proceed independently.
pub struct LobbyState {
    rooms: DashMap<String, Room>,
    games: DashMap<String, Game>, // room_id -> game
    channels: DashMap<String, broadcast::Sender<ServerMessage>>, // player_id -> tx
    locations: DashMap<String, String>, // player_id -> room_id
    vote_timeout: Duration,
    results_delay: Duration,
}

impl LobbyState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            games: DashMap::new(),
            channels: DashMap::new(),
            locations: DashMap::new(),
            vote_timeout: DEFAULT_VOTE_TIMEOUT,
            results_delay: DEFAULT_RESULTS_DELAY,
        }
    }

    pub fn with_timeouts(mut self, vote_timeout: Duration, results_delay: Duration) -> Self {
        self.vote_timeout = vote_timeout;
        self.results_delay = results_delay;
        self
    }

    pub fn vote_timeout(&self) -> Duration {
        self.vote_timeout
    }

    pub fn results_delay(&self) -> Duration {
        self.results_delay
    }

    pub fn room_id_of(&self, player_id: &str) -> Option<String> {
        self.locations.get(player_id).map(|r| r.clone())
    }

    /// Create a room with the caller as host.
    pub fn create_room(
        &self,
        nickname: &str,
        tx: broadcast::Sender<ServerMessage>,
    ) -> Result<(RoomInfo, Player), LobbyError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(LobbyError::EmptyNickname);
        }

        let room_id = generate_unique_room_id(|id| self.rooms.contains_key(id));
        let mut host = Player::new(nickname);
        host.is_host = true;
        let player = host.clone();

        self.channels.insert(host.id.clone(), tx);
        self.locations.insert(host.id.clone(), room_id.clone());
        let room = Room::new(room_id.clone(), host);
        let room_info = room.info();
        self.rooms.insert(room_id.clone(), room);

        info!(room_id, nickname, "Room created");
        Ok((room_info, player))
    }

    pub fn join_room(
        &self,
        room_id: &str,
        nickname: &str,
        tx: broadcast::Sender<ServerMessage>,
    ) -> Result<(RoomInfo, Player), LobbyError> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(LobbyError::EmptyNickname);
        }

        let mut room = self.rooms.get_mut(room_id).ok_or(LobbyError::RoomNotFound)?;
        if room.is_full() {
            return Err(LobbyError::RoomFull);
        }
        if room.has_nickname(nickname) {
            return Err(LobbyError::NicknameTaken);
        }

        let player = Player::new(nickname);
        self.channels.insert(player.id.clone(), tx);
        self.locations.insert(player.id.clone(), room_id.to_string());
        room.players.push(player.clone());

        info!(room_id, nickname, "Player joined room");
        Ok((room.info(), player))
    }

    /// Remove a player from their room and from any running game's roster.
    /// Returns None if the player was not in a room. When the leaver was
    /// the last player still owing a topic, the game enters the word phase.
    pub fn leave_room(&self, player_id: &str) -> Option<LeaveInfo> {
        let (_, room_id) = self.locations.remove(player_id)?;
        self.channels.remove(player_id);

        let mut room = self.rooms.get_mut(&room_id)?;
        let idx = room.players.iter().position(|p| p.id == player_id)?;
        let player = room.players.remove(idx);

        if room.players.is_empty() {
            drop(room);
            self.rooms.remove(&room_id);
            self.games.remove(&room_id);
            info!(room_id, "Room emptied and removed");
            return Some(LeaveInfo {
                player,
                room: None,
                room_id,
                word_phase: None,
            });
        }

        if player.is_host {
            room.players[0].is_host = true;
        }
        let room_info = room.info();
        drop(room);

        let mut word_phase = None;
        if let Some(mut game) = self.games.get_mut(&room_id) {
            game.remove_player(player_id);
            if game.phase() == GamePhase::ProposingTopics && game.all_topics_proposed() {
                game.start_word_phase();
                word_phase = Some(game.get_game_state());
            }
        }

        info!(room_id, nickname = player.nickname, "Player left room");
        Some(LeaveInfo {
            player,
            room: Some(room_info),
            room_id,
            word_phase,
        })
    }

    /// Socket drop: keep the player on the roster, flagged disconnected,
    /// so they can reconnect with identity and score intact. The room is
    /// torn down once nobody in it is connected. A drop from a socket
    /// that is no longer the player's registered channel is ignored, so a
    /// lingering old connection cannot undo a reconnect.
    pub fn mark_disconnected(
        &self,
        player_id: &str,
        tx: &broadcast::Sender<ServerMessage>,
    ) -> Option<DisconnectInfo> {
        {
            let registered = self.channels.get(player_id)?;
            if !tx.same_channel(&registered) {
                return None;
            }
        }
        self.channels.remove(player_id);
        let room_id = self.locations.get(player_id).map(|r| r.clone())?;

        let mut room = self.rooms.get_mut(&room_id)?;
        room.player_by_id_mut(player_id)?.disconnect();
        let player = room.player_by_id(player_id)?.clone();
        let all_gone = room.players.iter().all(|p| !p.connected);
        let room_info = room.info();
        drop(room);

        if let Some(mut game) = self.games.get_mut(&room_id) {
            game.set_connected(player_id, false);
        }

        if all_gone {
            self.rooms.remove(&room_id);
            self.games.remove(&room_id);
            self.locations.retain(|_, v| *v != room_id);
            info!(room_id, "All players disconnected, room removed");
            return Some(DisconnectInfo {
                player,
                room_id,
                room: None,
            });
        }

        info!(room_id, nickname = player.nickname, "Player disconnected");
        Some(DisconnectInfo {
            player,
            room_id,
            room: Some(room_info),
        })
    }

    /// Rebind a disconnected player's transport channel.
    pub fn reconnect(
        &self,
        room_id: &str,
        player_id: &str,
        tx: broadcast::Sender<ServerMessage>,
    ) -> Result<(Player, Option<GameState>), LobbyError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(LobbyError::RoomNotFound)?;
        let player = room
            .player_by_id_mut(player_id)
            .ok_or(LobbyError::PlayerNotFound)?;
        player.reconnect();
        let player = player.clone();
        drop(room);

        self.channels.insert(player_id.to_string(), tx);
        self.locations
            .insert(player_id.to_string(), room_id.to_string());

        let game_state = self.games.get_mut(room_id).map(|mut game| {
            game.set_connected(player_id, true);
            game.get_game_state()
        });

        info!(room_id, nickname = player.nickname, "Player reconnected");
        Ok((player, game_state))
    }

    pub fn room_list(&self) -> Vec<RoomListItem> {
        self.rooms
            .iter()
            .map(|room| RoomListItem {
                id: room.id.clone(),
                player_count: room.players.len(),
                max_players: room.max_players,
                has_game: self.games.contains_key(&room.id),
                created_at_secs: room.created_at.elapsed().as_secs(),
            })
            .collect()
    }

    /// Host-only: snapshot the room roster into a fresh Game and start it.
    /// Any previous game in the room is replaced.
    pub fn start_game(
        &self,
        player_id: &str,
        max_rounds: u32,
        minimum_variance: bool,
    ) -> Result<GameState, LobbyError> {
        let room_id = self.room_id_of(player_id).ok_or(LobbyError::NotInRoom)?;
        let room = self.rooms.get(&room_id).ok_or(LobbyError::RoomNotFound)?;
        let caller = room
            .player_by_id(player_id)
            .ok_or(LobbyError::PlayerNotFound)?;
        if !caller.is_host {
            return Err(LobbyError::NotHost);
        }

        let mut game = Game::new(&room_id, player_id, max_rounds, minimum_variance)
            .with_vote_timeout(self.vote_timeout);
        for player in &room.players {
            game.add_player(player.clone());
        }
        drop(room);

        game.start_game()?;
        let state = game.get_game_state();
        self.games.insert(room_id.clone(), game);

        info!(room_id, max_rounds, minimum_variance, "Game started");
        Ok(state)
    }

    pub fn propose_topic(&self, player_id: &str, raw: &str) -> Result<TopicAccepted, LobbyError> {
        let text = raw.trim();
        if text.is_empty() {
            return Err(LobbyError::EmptyTopic);
        }
        if text.chars().count() > MAX_TOPIC_LENGTH {
            return Err(LobbyError::TopicTooLong);
        }

        let room_id = self.room_id_of(player_id).ok_or(LobbyError::NotInRoom)?;
        let mut game = self.games.get_mut(&room_id).ok_or(LobbyError::GameNotFound)?;

        let topic = game.propose_topic(player_id, text)?;
        let game_state = game.get_game_state();
        let word_phase = if game.all_topics_proposed() {
            game.start_word_phase();
            Some(game.get_game_state())
        } else {
            None
        };

        info!(room_id, topic = topic.text, "Topic proposed");
        Ok(TopicAccepted {
            topic,
            game_state,
            word_phase,
        })
    }

    pub fn propose_word(
        &self,
        player_id: &str,
        word: &str,
        related_topic: &str,
    ) -> Result<WordAccepted, LobbyError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(LobbyError::EmptyWord);
        }

        let room_id = self.room_id_of(player_id).ok_or(LobbyError::NotInRoom)?;
        let mut game = self.games.get_mut(&room_id).ok_or(LobbyError::GameNotFound)?;

        let round = game.propose_word(player_id, word, related_topic)?;
        info!(room_id, word, related_topic, "Word proposed");
        Ok(WordAccepted {
            round: VotingRoundState::from(&round),
            game_state: game.get_game_state(),
        })
    }

    pub fn vote_on_word(&self, player_id: &str, score: u8) -> Result<VoteAccepted, LobbyError> {
        let room_id = self.room_id_of(player_id).ok_or(LobbyError::NotInRoom)?;
        let mut game = self.games.get_mut(&room_id).ok_or(LobbyError::GameNotFound)?;

        let outcome = game.vote_on_word(player_id, score)?;
        info!(
            room_id,
            score,
            round_completed = outcome.round_completed,
            "Vote cast"
        );
        Ok(VoteAccepted {
            vote: outcome.vote,
            round_completed: outcome.round_completed,
            game_state: game.get_game_state(),
        })
    }

    /// Timer path: close the round only if it is still open past its
    /// deadline. Returns the snapshot when this call closed it.
    pub fn force_complete_if_expired(&self, room_id: &str) -> Option<GameState> {
        let mut game = self.games.get_mut(room_id)?;
        if !game.is_voting_expired() {
            return None;
        }
        if game.force_complete_voting() {
            info!(room_id, "Voting deadline reached, round closed");
            Some(game.get_game_state())
        } else {
            None
        }
    }

    /// Advance game flow after results were shown. The bool is true when
    /// this advance ended the game.
    pub fn advance_turn(&self, room_id: &str) -> Option<(GameState, bool)> {
        let mut game = self.games.get_mut(room_id)?;
        game.next_player_word_turn();
        let state = game.get_game_state();
        let finished = state.phase == GamePhase::Finished;
        Some((state, finished))
    }

    pub fn get_game_state(&self, player_id: &str) -> Result<GameState, LobbyError> {
        let room_id = self.room_id_of(player_id).ok_or(LobbyError::NotInRoom)?;
        let game = self.games.get(&room_id).ok_or(LobbyError::GameNotFound)?;
        Ok(game.get_game_state())
    }

    /// Send a message to every connected player in a room.
    pub fn broadcast_to_room(&self, room_id: &str, msg: ServerMessage) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        for player in &room.players {
            if let Some(tx) = self.channels.get(&player.id) {
                let _ = tx.send(msg.clone());
            }
        }
    }
}

impl Default for LobbyState {
    fn default() -> Self {
        Self::new()
    }
}
