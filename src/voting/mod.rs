pub mod summary;
pub mod tally;

pub use tally::{compute_result_set, compute_result_set_with};

use crate::models::Candidate;
use serde::Serialize;

/// How equal vote counts below the lead are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RankingPolicy {
    /// Standard competition ranking: every tie group shares the rank of its
    /// first member and the next group skips ahead ("1, 2, 2, 4").
    #[default]
    Competition,
    /// Only the leading tie group is collapsed to rank 1; everyone else is
    /// ranked by sorted position ("1, 2, 3, 4" for a tie in second place).
    LeadingTieOnly,
}

/// One candidate's computed position in a result view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub candidate: Candidate,
    pub votes: u64,
    pub percentage: f64,
    pub rank: usize,
}

/// Derived aggregation for one election snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub standings: Vec<Standing>,
    pub total_votes: u64,
    pub highest_votes: u64,
    pub top_candidates: Vec<Candidate>,
    pub is_tie: bool,
    pub winner: Option<Candidate>,
}

impl Standing {
    pub fn rounded_percentage(&self) -> f64 {
        (self.percentage * 10.0).round() / 10.0
    }
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.total_votes == 0
    }

    /// The source candidates in standing order, derived fields stripped.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.standings.iter().map(|s| s.candidate.clone()).collect()
    }

    pub fn standing_for(&self, candidate_id: &str) -> Option<&Standing> {
        self.standings
            .iter()
            .find(|s| s.candidate.id == candidate_id)
    }
}
