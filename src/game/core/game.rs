use super::error::GameError;
use super::player::Player;
use super::round::{Topic, Vote, VotingRound};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_VOTE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Waiting,
    ProposingTopics,
    Playing,
    Voting,
    VotingResults,
    Paused,
    Finished,
}

/// Outcome of a single vote: the recorded vote, plus whether this vote was
/// the last one needed and the round completed as a side effect.
#[derive(Debug, PartialEq)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub round_completed: bool,
}

/// One room's match: topic collection, turn rotation, word proposal,
/// voting, variance scoring, round advancement (pure logic, no I/O).
///
/// The roster is this game's own copy, snapshotted from the room at start;
/// the lobby keeps its own records and never shares mutable state with us.
pub struct Game {
    pub id: String,
    pub room_id: String,
    pub host_id: String,
    phase: GamePhase,
    players: Vec<Player>,
    topics: Vec<Topic>,
    current_player_index: usize,
    current_voting_round: Option<VotingRound>,
    completed_rounds: Vec<VotingRound>,
    round: u32,
    max_rounds: u32,
    minimum_variance: bool,
    vote_timeout: Duration,
    paused_from: Option<GamePhase>,
}

impl Game {
    pub fn new(room_id: &str, host_id: &str, max_rounds: u32, minimum_variance: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            host_id: host_id.to_string(),
            phase: GamePhase::Waiting,
            players: Vec::new(),
            topics: Vec::new(),
            current_player_index: 0,
            current_voting_round: None,
            completed_rounds: Vec::new(),
            round: 0,
            max_rounds,
            minimum_variance,
            vote_timeout: DEFAULT_VOTE_TIMEOUT,
            paused_from: None,
        }
    }

    pub fn with_vote_timeout(mut self, timeout: Duration) -> Self {
        self.vote_timeout = timeout;
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn current_voting_round(&self) -> Option<&VotingRound> {
        self.current_voting_round.as_ref()
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Nickname of whoever's action is currently expected.
    pub fn current_player_turn(&self) -> Option<String> {
        self.current_player().map(|p| p.nickname.clone())
    }

    pub fn add_player(&mut self, player: Player) {
        if !self.players.iter().any(|p| p.id == player.id) {
            self.players.push(player);
        }
    }

    /// Remove a player from the roster, reassigning the host flag to the
    /// first remaining player if the host left, and reclamping the turn
    /// pointer into the shrunken roster.
    pub fn remove_player(&mut self, player_id: &str) {
        self.players.retain(|p| p.id != player_id);
        if self.host_id == player_id {
            if let Some(first) = self.players.first_mut() {
                first.is_host = true;
                self.host_id = first.id.clone();
            }
        }
        if self.players.is_empty() {
            self.current_player_index = 0;
        } else {
            self.current_player_index %= self.players.len();
        }
        if self.phase == GamePhase::ProposingTopics {
            self.skip_players_with_topics();
        }
    }

    /// During topic collection the turn pointer must rest on a player who
    /// still owes a topic; a roster change can leave it on someone who
    /// already proposed.
    fn skip_players_with_topics(&mut self) {
        for _ in 0..self.players.len() {
            let Some(current) = self.current_player() else {
                return;
            };
            if !self.topics.iter().any(|t| t.proposed_by == current.id) {
                return;
            }
            self.advance_turn();
        }
    }

    /// Mirror a lobby connection change into this game's roster copy.
    pub fn set_connected(&mut self, player_id: &str, connected: bool) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == player_id) {
            if connected {
                player.reconnect();
            } else {
                player.disconnect();
            }
        }
    }

    pub fn start_game(&mut self) -> Result<(), GameError> {
        if self.players.len() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        self.phase = GamePhase::ProposingTopics;
        self.round = 1;
        self.current_player_index = 0;
        for player in &mut self.players {
            player.reset_score();
        }
        Ok(())
    }

    /// Record a topic from the current-turn player and pass the turn on.
    /// The text arrives pre-sanitized by the lobby layer; it is stored as-is.
    pub fn propose_topic(&mut self, player_id: &str, text: &str) -> Result<Topic, GameError> {
        if self.phase != GamePhase::ProposingTopics {
            return Err(GameError::NotProposingTopics);
        }
        let player = self.player_by_id(player_id)?;
        if self.current_player_turn().as_deref() != Some(player.nickname.as_str()) {
            return Err(GameError::NotYourTurn);
        }
        if self.topics.iter().any(|t| t.proposed_by == player_id) {
            return Err(GameError::TopicAlreadyProposed);
        }

        let topic = Topic {
            proposed_by: player.id.clone(),
            proposer_name: player.nickname.clone(),
            text: text.to_string(),
        };
        self.topics.push(topic.clone());
        self.advance_turn();
        Ok(topic)
    }

    /// Every current roster member has a topic on record. Checked per
    /// player rather than by count, so topics left behind by departed
    /// players never satisfy it on someone else's behalf.
    pub fn all_topics_proposed(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.topics.iter().any(|t| t.proposed_by == p.id))
    }

    /// Topic collection is done; word turns begin with the first roster
    /// entry regardless of who proposed the last topic.
    pub fn start_word_phase(&mut self) {
        self.phase = GamePhase::Playing;
        self.current_player_index = 0;
    }

    /// Put a word up for vote. Opens the single in-flight voting round with
    /// a deadline of now + the configured vote timeout.
    pub fn propose_word(
        &mut self,
        player_id: &str,
        word: &str,
        related_topic: &str,
    ) -> Result<VotingRound, GameError> {
        match self.phase {
            GamePhase::Voting => return Err(GameError::VotingInProgress),
            GamePhase::Playing => {}
            _ => return Err(GameError::NotPlaying),
        }
        let player = self.player_by_id(player_id)?;
        if self.current_player_turn().as_deref() != Some(player.nickname.as_str()) {
            return Err(GameError::NotYourTurn);
        }
        if !self.topics.iter().any(|t| t.text == related_topic) {
            return Err(GameError::UnknownTopic(related_topic.to_string()));
        }

        let round = VotingRound::new(
            word.to_string(),
            related_topic.to_string(),
            player.id.clone(),
            player.nickname.clone(),
            self.vote_timeout,
        );
        self.current_voting_round = Some(round.clone());
        self.phase = GamePhase::Voting;
        Ok(round)
    }

    /// Cast a vote on the word under vote. Completes the round as a side
    /// effect when every player except the proposer has voted.
    pub fn vote_on_word(&mut self, player_id: &str, score: u8) -> Result<VoteOutcome, GameError> {
        if !(1..=10).contains(&score) {
            return Err(GameError::ScoreOutOfRange);
        }
        let voter_name = self.player_by_id(player_id)?.nickname.clone();
        let roster_size = self.players.len();

        let round = self
            .current_voting_round
            .as_mut()
            .ok_or(GameError::NoVotingRound)?;
        if round.proposed_by == player_id {
            return Err(GameError::ProposerCannotVote);
        }
        if round.has_voted(player_id) {
            return Err(GameError::AlreadyVoted);
        }

        let vote = Vote {
            voter_id: player_id.to_string(),
            voter_name,
            score,
        };
        round.votes.push(vote.clone());

        let round_completed = round.votes.len() >= roster_size.saturating_sub(1);
        if round_completed {
            self.complete_voting_round();
        }
        Ok(VoteOutcome {
            vote,
            round_completed,
        })
    }

    /// Close the in-flight round: compute average/variance, credit the
    /// proposer, move the round into the completed list. No-op when no
    /// round is in flight, so threshold and timer completion can race.
    pub fn complete_voting_round(&mut self) {
        let Some(mut round) = self.current_voting_round.take() else {
            return;
        };
        round.finalize();
        let delta = round.score_delta(self.minimum_variance);
        if let Some(proposer) = self.players.iter_mut().find(|p| p.id == round.proposed_by) {
            proposer.update_score(delta);
        }
        self.completed_rounds.push(round);
        self.phase = GamePhase::VotingResults;
    }

    /// Timer-driven completion. Returns true if this call closed the round.
    pub fn force_complete_voting(&mut self) -> bool {
        if self.current_voting_round.is_some() {
            self.complete_voting_round();
            true
        } else {
            false
        }
    }

    pub fn is_voting_expired(&self) -> bool {
        self.current_voting_round
            .as_ref()
            .is_some_and(|r| r.is_expired())
    }

    /// Move on after the results of a round have been shown. Starts a fresh
    /// round (or ends the game when the round budget is spent) once every
    /// player has had a proposer turn; otherwise just passes the turn.
    pub fn next_player_word_turn(&mut self) {
        if self.phase == GamePhase::Finished {
            return;
        }
        if self.completed_rounds.len() >= self.players.len() {
            if self.round >= self.max_rounds {
                self.end_game();
                return;
            }
            self.round += 1;
            self.completed_rounds.clear();
            self.current_player_index = 0;
        } else {
            self.advance_turn();
        }
        self.phase = GamePhase::Playing;
    }

    /// Finish the match and rank the roster. Minimum-variance mode ranks
    /// ascending (lowest score wins); otherwise descending.
    pub fn end_game(&mut self) {
        self.phase = GamePhase::Finished;
        if self.minimum_variance {
            self.players.sort_by(|a, b| a.score.total_cmp(&b.score));
        } else {
            self.players.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
    }

    pub fn get_winner(&self) -> Option<&Player> {
        if self.phase != GamePhase::Finished {
            return None;
        }
        self.players.first()
    }

    /// Pause from any phase, remembering where we were so resume can
    /// return there instead of always landing in Playing.
    pub fn pause_game(&mut self) {
        if self.phase != GamePhase::Paused {
            self.paused_from = Some(self.phase);
            self.phase = GamePhase::Paused;
        }
    }

    pub fn resume_game(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = self.paused_from.take().unwrap_or(GamePhase::Playing);
        }
    }

    /// A serializable, side-effect-free snapshot suitable for clients.
    pub fn get_game_state(&self) -> GameState {
        GameState {
            id: self.id.clone(),
            room_id: self.room_id.clone(),
            phase: self.phase,
            players: self.players.clone(),
            topics: self.topics.clone(),
            current_player_turn: self.current_player_turn(),
            current_voting_round: self.current_voting_round.as_ref().map(VotingRoundState::from),
            completed_rounds: self
                .completed_rounds
                .iter()
                .map(VotingRoundState::from)
                .collect(),
            round: self.round,
            max_rounds: self.max_rounds,
            minimum_variance: self.minimum_variance,
            host_id: self.host_id.clone(),
        }
    }

    fn player_by_id(&self, player_id: &str) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.id == player_id)
            .ok_or(GameError::UnknownPlayer)
    }

    fn advance_turn(&mut self) {
        if !self.players.is_empty() {
            self.current_player_index = (self.current_player_index + 1) % self.players.len();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub id: String,
    pub room_id: String,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub topics: Vec<Topic>,
    pub current_player_turn: Option<String>,
    pub current_voting_round: Option<VotingRoundState>,
    pub completed_rounds: Vec<VotingRoundState>,
    pub round: u32,
    pub max_rounds: u32,
    pub minimum_variance: bool,
    pub host_id: String,
}

/// Wire view of a voting round; the internal deadline becomes a
/// seconds-remaining countdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingRoundState {
    pub word: String,
    pub related_topic: String,
    pub proposed_by: String,
    pub proposer_name: String,
    pub votes: Vec<Vote>,
    pub is_complete: bool,
    pub average: f64,
    pub variance: f64,
    pub seconds_remaining: u64,
}

impl From<&VotingRound> for VotingRoundState {
    fn from(round: &VotingRound) -> Self {
        Self {
            word: round.word.clone(),
            related_topic: round.related_topic.clone(),
            proposed_by: round.proposed_by.clone(),
            proposer_name: round.proposer_name.clone(),
            votes: round.votes.clone(),
            is_complete: round.is_complete,
            average: round.average,
            variance: round.variance,
            seconds_remaining: if round.is_complete {
                0
            } else {
                round.seconds_remaining()
            },
        }
    }
}
