mod room;
mod room_id;
mod state;

pub use room::{Room, RoomInfo, RoomListItem};
pub use state::{
    DEFAULT_RESULTS_DELAY, DisconnectInfo, LeaveInfo, LobbyError, LobbyState, TopicAccepted,
    VoteAccepted, WordAccepted,
};
