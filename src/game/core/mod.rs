mod error;
mod game;
mod player;
mod round;

pub use error::GameError;
pub use game::{DEFAULT_VOTE_TIMEOUT, Game, GamePhase, GameState, VoteOutcome, VotingRoundState};
pub use player::Player;
pub use round::{Topic, Vote, VotingRound};
