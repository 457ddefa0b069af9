//! Backend payload shapes and their normalization into [`Election`].
//!
//! The results endpoint is loosely typed: identities arrive as `id` or
//! `_id`, as strings or numbers, `party` may be missing, and vote counts
//! are plain JSON numbers. Everything is mapped onto the strict model
//! here so that no missing field ever reaches the tally arithmetic.

use super::{Candidate, Election, ElectionStatus};
use crate::error::{SourceError, TallyError};
use log::debug;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsPayload {
    pub election: Option<RawElection>,
    #[serde(default)]
    pub candidates: Vec<RawCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawElection {
    pub id: Option<Value>,
    #[serde(rename = "_id")]
    pub object_id: Option<Value>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCandidate {
    pub id: Option<Value>,
    #[serde(rename = "_id")]
    pub object_id: Option<Value>,
    pub name: Option<String>,
    pub party: Option<String>,
    pub votes: Option<Value>,
}

/// Decodes a results response body and normalizes it.
pub fn parse_results(body: &[u8], election_id: &str) -> Result<Election, SourceError> {
    let payload: ResultsPayload = serde_json::from_slice(body)?;
    normalize(payload, election_id)
}

/// Maps a decoded payload onto [`Election`]. `election_id` is used when the
/// payload does not repeat the election's own identity.
pub fn normalize(payload: ResultsPayload, election_id: &str) -> Result<Election, SourceError> {
    let raw = payload
        .election
        .ok_or_else(|| SourceError::MalformedResponse("missing election object".to_string()))?;

    let status_label = raw
        .status
        .as_deref()
        .ok_or_else(|| SourceError::MalformedResponse("election has no status".to_string()))?;
    let status = ElectionStatus::parse(status_label).ok_or_else(|| {
        SourceError::MalformedResponse(format!("unknown election status {status_label:?}"))
    })?;

    let id = identity(raw.id.as_ref())
        .or_else(|| identity(raw.object_id.as_ref()))
        .unwrap_or_else(|| election_id.to_string());

    let title = raw
        .title
        .or(raw.name)
        .filter(|title| !title.trim().is_empty());

    let candidates = payload
        .candidates
        .into_iter()
        .enumerate()
        .map(|(position, raw)| normalize_candidate(position, raw))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "Normalized election {} ({}) with {} candidate(s)",
        id,
        status,
        candidates.len()
    );

    Ok(Election {
        id,
        title,
        status,
        candidates,
    })
}

fn normalize_candidate(position: usize, raw: RawCandidate) -> Result<Candidate, SourceError> {
    let id = identity(raw.id.as_ref())
        .or_else(|| identity(raw.object_id.as_ref()))
        .ok_or_else(|| {
            SourceError::MalformedResponse(format!("candidate at position {position} has no id"))
        })?;

    let name = raw
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| SourceError::MalformedResponse(format!("candidate {id} has no name")))?;

    let votes = match raw.votes {
        Some(value) => vote_count(&id, &value)?,
        None => {
            return Err(SourceError::MalformedResponse(format!(
                "candidate {id} has no vote count"
            )));
        }
    };

    Ok(Candidate::new(id, name, votes).with_party(raw.party.unwrap_or_default()))
}

fn identity(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Negative counts pass through; the reducer is the one that rejects them.
fn vote_count(candidate_id: &str, value: &Value) -> Result<i64, SourceError> {
    let Value::Number(number) = value else {
        return Err(SourceError::MalformedResponse(format!(
            "candidate {candidate_id} has a non-numeric vote count"
        )));
    };

    if let Some(votes) = number.as_i64() {
        return Ok(votes);
    }
    if number.as_u64().is_some() {
        return Err(TallyError::invalid(candidate_id, "vote count out of range").into());
    }

    match number.as_f64() {
        Some(votes) if votes.is_finite() && votes.fract() == 0.0 && votes.abs() < i64::MAX as f64 => {
            Ok(votes as i64)
        }
        Some(votes) if !votes.is_finite() => {
            Err(TallyError::invalid(candidate_id, "vote count is not finite").into())
        }
        _ => Err(TallyError::invalid(candidate_id, format!("vote count {number} is not a whole number")).into()),
    }
}
