//! Election results view-model: turns fetched candidate tallies into ranked
//! standings with winner and tie detection, and drives the fetch lifecycle
//! for a results view.

pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod tasks;
pub mod viewmodel;
pub mod voting;

pub use error::{ConfigError, SourceError, TallyError};
pub use models::{Candidate, Election, ElectionStatus};
pub use voting::{RankingPolicy, ResultSet, Standing, compute_result_set};
