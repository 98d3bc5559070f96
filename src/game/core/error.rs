use thiserror::Error;

/// Business-rule failures. These are expected outcomes, safe to retry with
/// corrected input; the ws layer relays the message to the offending client.
#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("need at least 2 players to start")]
    NotEnoughPlayers,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("topics can only be proposed during the proposing phase")]
    NotProposingTopics,
    #[error("you have already proposed a topic")]
    TopicAlreadyProposed,
    #[error("words can only be proposed during play")]
    NotPlaying,
    #[error("voting is already in progress")]
    VotingInProgress,
    #[error("no topic matches \"{0}\"")]
    UnknownTopic(String),
    #[error("no word is being voted on")]
    NoVotingRound,
    #[error("the proposer cannot vote on their own word")]
    ProposerCannotVote,
    #[error("you have already voted this round")]
    AlreadyVoted,
    #[error("score must be between 1 and 10")]
    ScoreOutOfRange,
    #[error("player is not in this game")]
    UnknownPlayer,
}
