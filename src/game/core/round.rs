use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// A short phrase submitted once per player during the proposing phase,
/// later referenced by word proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub proposed_by: String,
    pub proposer_name: String,
    pub text: String,
}

/// One voter's 1-10 score for the word under vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    pub voter_name: String,
    pub score: u8,
}

/// The bounded window in which all non-proposing players score a word.
/// At most one is in flight per game.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingRound {
    pub word: String,
    pub related_topic: String,
    pub proposed_by: String,
    pub proposer_name: String,
    pub votes: Vec<Vote>,
    pub deadline: Instant,
    pub is_complete: bool,
    pub average: f64,
    pub variance: f64,
}

impl VotingRound {
    pub fn new(
        word: String,
        related_topic: String,
        proposed_by: String,
        proposer_name: String,
        vote_timeout: Duration,
    ) -> Self {
        Self {
            word,
            related_topic,
            proposed_by,
            proposer_name,
            votes: Vec::new(),
            deadline: Instant::now() + vote_timeout,
            is_complete: false,
            average: 0.0,
            variance: 0.0,
        }
    }

    pub fn has_voted(&self, voter_id: &str) -> bool {
        self.votes.iter().any(|v| v.voter_id == voter_id)
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() > self.deadline
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_secs()
    }

    /// Compute the round's average and variance and mark it complete.
    /// The variance is the raw sum of squared deviations, not divided by
    /// the vote count.
    pub fn finalize(&mut self) {
        let count = self.votes.len();
        self.average = if count == 0 {
            0.0
        } else {
            self.votes.iter().map(|v| v.score as f64).sum::<f64>() / count as f64
        };
        self.variance = self
            .votes
            .iter()
            .map(|v| (v.score as f64 - self.average).powi(2))
            .sum();
        self.is_complete = true;
    }

    /// The proposer's score delta for this round. Minimum-variance mode
    /// rewards consensus; otherwise dispersion itself is the reward.
    pub fn score_delta(&self, minimum_variance: bool) -> f64 {
        if minimum_variance {
            (10.0 - self.variance).max(0.0)
        } else {
            self.variance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_with_scores(scores: &[u8]) -> VotingRound {
        let mut round = VotingRound::new(
            "glacier".to_string(),
            "cold things".to_string(),
            "p1".to_string(),
            "Alice".to_string(),
            Duration::from_secs(30),
        );
        for (i, score) in scores.iter().enumerate() {
            round.votes.push(Vote {
                voter_id: format!("v{i}"),
                voter_name: format!("Voter {i}"),
                score: *score,
            });
        }
        round.finalize();
        round
    }

    #[test]
    fn unanimous_votes_have_zero_variance() {
        let round = round_with_scores(&[7, 7, 7]);
        assert_eq!(round.average, 7.0);
        assert_eq!(round.variance, 0.0);
        assert_eq!(round.score_delta(false), 0.0);
        // Full consensus reward in minimum-variance mode
        assert_eq!(round.score_delta(true), 10.0);
    }

    #[test]
    fn split_votes_sum_squared_deviations() {
        let round = round_with_scores(&[1, 10]);
        assert_eq!(round.average, 5.5);
        // (1-5.5)^2 + (10-5.5)^2, not divided by the count
        assert_eq!(round.variance, 40.5);
        assert_eq!(round.score_delta(false), 40.5);
        assert_eq!(round.score_delta(true), 0.0);
    }

    #[test]
    fn finalize_with_no_votes_floors_at_zero() {
        let round = round_with_scores(&[]);
        assert_eq!(round.average, 0.0);
        assert_eq!(round.variance, 0.0);
        assert!(round.is_complete);
    }

    #[test]
    fn has_voted_tracks_voter_ids() {
        let round = round_with_scores(&[5, 8]);
        assert!(round.has_voted("v0"));
        assert!(round.has_voted("v1"));
        assert!(!round.has_voted("p1"));
    }

    #[test]
    fn fresh_round_is_not_expired() {
        let round = VotingRound::new(
            "glacier".to_string(),
            "cold things".to_string(),
            "p1".to_string(),
            "Alice".to_string(),
            Duration::from_secs(30),
        );
        assert!(!round.is_expired());
        assert!(round.seconds_remaining() > 0);
    }

    #[test]
    fn zero_timeout_round_expires_immediately() {
        let round = VotingRound::new(
            "glacier".to_string(),
            "cold things".to_string(),
            "p1".to_string(),
            "Alice".to_string(),
            Duration::ZERO,
        );
        std::thread::sleep(Duration::from_millis(5));
        assert!(round.is_expired());
        assert_eq!(round.seconds_remaining(), 0);
    }
}
