use crate::error::TallyError;
use crate::models::Candidate;
use crate::voting::{RankingPolicy, ResultSet, Standing};

/// Builds the standings for a candidate list with the default ranking policy.
pub fn compute_result_set(candidates: &[Candidate]) -> Result<ResultSet, TallyError> {
    compute_result_set_with(candidates, RankingPolicy::default())
}

/// Builds the standings for a candidate list.
///
/// Candidates are ordered by votes descending; equal counts keep the order
/// they arrived in. An empty list, or one where nobody has a vote yet, is a
/// valid result with no winner and no tie.
pub fn compute_result_set_with(
    candidates: &[Candidate],
    policy: RankingPolicy,
) -> Result<ResultSet, TallyError> {
    let mut counts = Vec::with_capacity(candidates.len());
    let mut total_votes: u64 = 0;

    for candidate in candidates {
        let votes = u64::try_from(candidate.votes).map_err(|_| {
            TallyError::invalid(
                &candidate.id,
                format!("negative vote count {}", candidate.votes),
            )
        })?;
        total_votes = total_votes
            .checked_add(votes)
            .ok_or_else(|| TallyError::invalid(&candidate.id, "total vote count overflows"))?;
        counts.push(votes);
    }

    let highest_votes = counts.iter().copied().max().unwrap_or(0);

    let top_candidates: Vec<Candidate> = if total_votes == 0 {
        Vec::new()
    } else {
        candidates
            .iter()
            .zip(&counts)
            .filter(|(_, votes)| **votes == highest_votes)
            .map(|(candidate, _)| candidate.clone())
            .collect()
    };
    let is_tie = top_candidates.len() > 1;
    let winner = if !is_tie && highest_votes > 0 {
        top_candidates.first().cloned()
    } else {
        None
    };

    // sort_by is stable, which keeps arrival order among equal counts
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|a, b| counts[*b].cmp(&counts[*a]));

    let sorted_votes: Vec<u64> = order.iter().map(|&i| counts[i]).collect();
    let ranks = assign_ranks(&sorted_votes, policy, is_tie);

    let standings = order
        .iter()
        .zip(ranks)
        .map(|(&i, rank)| Standing {
            candidate: candidates[i].clone(),
            votes: counts[i],
            percentage: percentage(counts[i], total_votes),
            rank,
        })
        .collect();

    Ok(ResultSet {
        standings,
        total_votes,
        highest_votes,
        top_candidates,
        is_tie,
        winner,
    })
}

fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 / total as f64 * 100.0
    }
}

// `sorted_votes` must already be in descending order.
fn assign_ranks(sorted_votes: &[u64], policy: RankingPolicy, leading_tie: bool) -> Vec<usize> {
    let mut ranks: Vec<usize> = Vec::with_capacity(sorted_votes.len());

    for (index, votes) in sorted_votes.iter().enumerate() {
        let rank = match policy {
            RankingPolicy::Competition => {
                if index > 0 && sorted_votes[index - 1] == *votes {
                    ranks[index - 1]
                } else {
                    index + 1
                }
            }
            RankingPolicy::LeadingTieOnly => {
                if leading_tie && *votes == sorted_votes[0] {
                    1
                } else {
                    index + 1
                }
            }
        };
        ranks.push(rank);
    }

    ranks
}
