use super::ResultsSource;
use crate::error::SourceError;
use crate::models::{Candidate, Election, ElectionStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Replays canned replies in order, each after its own delay.
pub struct ScriptedSource {
    replies: Mutex<VecDeque<(Duration, Result<Election, SourceError>)>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(replies: Vec<(Duration, Result<Election, SourceError>)>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultsSource for ScriptedSource {
    async fn fetch_results(&self, _election_id: &str) -> Result<Election, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.replies.lock().unwrap().pop_front();
        let Some((delay, reply)) = next else {
            return Err(SourceError::MalformedResponse("script exhausted".to_string()));
        };
        tokio::time::sleep(delay).await;
        reply
    }
}

pub fn election(status: ElectionStatus, votes: &[(&str, i64)]) -> Election {
    Election {
        id: "e-1".to_string(),
        title: Some("Board election".to_string()),
        status,
        candidates: votes
            .iter()
            .map(|(name, v)| Candidate::new(name.to_lowercase(), *name, *v))
            .collect(),
    }
}
