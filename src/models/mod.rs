pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;

pub const INDEPENDENT_PARTY: &str = "Independent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub party: String,
    pub votes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: String,
    pub title: Option<String>,
    pub status: ElectionStatus,
    pub candidates: Vec<Candidate>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, votes: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            party: INDEPENDENT_PARTY.to_string(),
            votes,
        }
    }

    pub fn with_party(mut self, party: impl Into<String>) -> Self {
        let party = party.into();
        self.party = if party.trim().is_empty() {
            INDEPENDENT_PARTY.to_string()
        } else {
            party
        };
        self
    }
}

impl ElectionStatus {
    /// Backends disagree on the label for a running election, so both
    /// "ongoing" and "active" are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Some(ElectionStatus::Upcoming),
            "ongoing" | "active" => Some(ElectionStatus::Ongoing),
            "completed" => Some(ElectionStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElectionStatus::Upcoming => "upcoming",
            ElectionStatus::Ongoing => "ongoing",
            ElectionStatus::Completed => "completed",
        };
        f.write_str(label)
    }
}

impl Election {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}
