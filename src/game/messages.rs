use super::core::{GameState, Player, Topic, Vote, VotingRoundState};
use super::lobby::{RoomInfo, RoomListItem};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        nickname: String,
    },
    JoinRoom {
        room_id: String,
        nickname: String,
    },
    Reconnect {
        room_id: String,
        player_id: String,
    },
    ListRooms,
    LeaveRoom,
    StartGame {
        max_rounds: u32,
        minimum_variance: bool,
    },
    ProposeTopic {
        topic: String,
    },
    ProposeWord {
        word: String,
        related_topic: String,
    },
    VoteOnWord {
        score: u8,
    },
    GetGameState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomCreated {
        room: RoomInfo,
        player: Player,
    },
    PlayerJoined {
        player: Player,
        room: RoomInfo,
    },
    PlayerLeft {
        player: Player,
        room: RoomInfo,
    },
    PlayerDisconnected {
        player: Player,
        room: RoomInfo,
    },
    PlayerReconnected {
        player: Player,
        game_state: Option<GameState>,
    },
    RoomList {
        rooms: Vec<RoomListItem>,
    },
    GameStarted {
        game_state: GameState,
    },
    TopicProposed {
        topic: Topic,
        game_state: GameState,
    },
    AllTopicsProposed {
        game_state: GameState,
    },
    WordProposed {
        round: VotingRoundState,
        game_state: GameState,
    },
    VoteCast {
        vote: Vote,
    },
    VotingCompleted {
        game_state: GameState,
    },
    NextPlayerTurn {
        game_state: GameState,
    },
    GameEnded {
        game_state: GameState,
    },
    CurrentState {
        game_state: GameState,
    },
    Error {
        message: String,
    },
}
