//! Fetch lifecycle for one results view.
//!
//! Every `load` takes a ticket from a counter kept in the same watch channel
//! as the state, and its outcome is written only if the ticket is still the
//! newest one. Older responses that arrive late are dropped.

use crate::error::SourceError;
use crate::models::{Candidate, Election, ElectionStatus};
use crate::source::ResultsSource;
use crate::voting::{RankingPolicy, ResultSet, compute_result_set_with};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

const DEFAULT_CELEBRATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewModelSettings {
    pub celebration_duration: Duration,
    pub ranking: RankingPolicy,
}

impl Default for ViewModelSettings {
    fn default() -> Self {
        Self {
            celebration_duration: DEFAULT_CELEBRATION,
            ranking: RankingPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Loading,
    Ready(ResultsView),
    Failed(LoadFailure),
}

/// A successfully loaded snapshot, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub election_id: String,
    pub title: Option<String>,
    pub status: ElectionStatus,
    pub results: ResultSet,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    FetchFailed,
    MalformedResponse,
    InvalidTallyInput,
}

/// The user-facing side of a failed load. `dismissed` only hides the
/// notification; the view stays `Failed` until the next load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: FailureKind,
    pub message: String,
    pub detail: String,
    pub dismissed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Celebration {
    pub id: Uuid,
    pub winner: Candidate,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    /// Ticket of the most recently issued load.
    pub request: u64,
    pub state: ViewState,
    pub celebration: Option<Celebration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Superseded,
}

pub struct ResultsViewModel {
    view_id: Uuid,
    election_id: String,
    settings: ViewModelSettings,
    shared: Arc<watch::Sender<ViewSnapshot>>,
}

impl LoadFailure {
    fn new(kind: FailureKind, detail: String) -> Self {
        let message = match kind {
            FailureKind::FetchFailed => "Could not load election results.",
            FailureKind::MalformedResponse => "The election results could not be read.",
            FailureKind::InvalidTallyInput => "Failed to compute results.",
        };
        Self {
            kind,
            message: message.to_string(),
            detail,
            dismissed: false,
        }
    }

    fn from_source(error: &SourceError) -> Self {
        let kind = match error {
            SourceError::Http(_) | SourceError::Status { .. } | SourceError::Decode(_) => {
                FailureKind::FetchFailed
            }
            SourceError::MalformedResponse(_) => FailureKind::MalformedResponse,
            SourceError::InvalidTally(_) => FailureKind::InvalidTallyInput,
        };
        Self::new(kind, error.to_string())
    }
}

impl ResultsViewModel {
    pub fn new(election_id: impl Into<String>, settings: ViewModelSettings) -> Self {
        let (sender, _) = watch::channel(ViewSnapshot {
            request: 0,
            state: ViewState::Idle,
            celebration: None,
        });

        Self {
            view_id: Uuid::new_v4(),
            election_id: election_id.into(),
            settings,
            shared: Arc::new(sender),
        }
    }

    pub fn election_id(&self) -> &str {
        &self.election_id
    }

    pub fn current_state(&self) -> ViewState {
        self.shared.borrow().state.clone()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.shared.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.shared.subscribe()
    }

    /// The celebration raised by the last winning load, while it lasts.
    pub fn celebration(&self) -> Option<Celebration> {
        self.shared
            .borrow()
            .celebration
            .clone()
            .filter(|c| Instant::now() < c.expires_at)
    }

    /// Hides the failure notification. Returns false when there was nothing
    /// to dismiss.
    pub fn dismiss_error(&self) -> bool {
        self.shared.send_if_modified(|snapshot| match &mut snapshot.state {
            ViewState::Failed(failure) if !failure.dismissed => {
                failure.dismissed = true;
                true
            }
            _ => false,
        })
    }

    /// Fetches the election from `source`, recomputes the standings, and
    /// publishes the outcome unless a newer load was started meanwhile.
    pub async fn load<S>(&self, source: &S) -> LoadOutcome
    where
        S: ResultsSource + ?Sized,
    {
        let mut ticket = 0;
        self.shared.send_modify(|snapshot| {
            snapshot.request += 1;
            ticket = snapshot.request;
            snapshot.state = ViewState::Loading;
        });
        debug!("[view {}] load #{} started for election {}", self.view_id, ticket, self.election_id);

        let next = match source.fetch_results(&self.election_id).await {
            Ok(election) => self.reduce(election),
            Err(e) => {
                warn!("[view {}] load #{} failed: {}", self.view_id, ticket, e);
                ViewState::Failed(LoadFailure::from_source(&e))
            }
        };
        let celebration = self.celebration_for(&next);

        let applied = self.shared.send_if_modified(|snapshot| {
            if snapshot.request != ticket {
                return false;
            }
            snapshot.state = next;
            if celebration.is_some() {
                snapshot.celebration = celebration.clone();
            }
            true
        });

        if !applied {
            debug!("[view {}] discarding stale response for load #{}", self.view_id, ticket);
            return LoadOutcome::Superseded;
        }

        if let Some(celebration) = celebration {
            info!(
                "[view {}] {} won election {}",
                self.view_id, celebration.winner.name, self.election_id
            );
            self.schedule_celebration_reset(celebration);
        }

        LoadOutcome::Applied
    }

    fn reduce(&self, election: Election) -> ViewState {
        match compute_result_set_with(&election.candidates, self.settings.ranking) {
            Ok(results) => ViewState::Ready(ResultsView {
                election_id: election.id,
                title: election.title,
                status: election.status,
                results,
                fetched_at: Utc::now(),
            }),
            Err(e) => {
                warn!("[view {}] could not tally election {}: {}", self.view_id, election.id, e);
                ViewState::Failed(LoadFailure::new(FailureKind::InvalidTallyInput, e.to_string()))
            }
        }
    }

    fn celebration_for(&self, state: &ViewState) -> Option<Celebration> {
        let ViewState::Ready(view) = state else {
            return None;
        };
        if view.status != ElectionStatus::Completed || view.results.highest_votes == 0 {
            return None;
        }

        view.results.winner.clone().map(|winner| Celebration {
            id: Uuid::new_v4(),
            winner,
            expires_at: Instant::now() + self.settings.celebration_duration,
        })
    }

    // The timer only holds a weak handle, so a dropped view-model is never
    // touched after teardown.
    fn schedule_celebration_reset(&self, celebration: Celebration) {
        let shared = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            tokio::time::sleep_until(celebration.expires_at).await;
            if let Some(shared) = shared.upgrade() {
                shared.send_if_modified(|snapshot| match &snapshot.celebration {
                    Some(active) if active.id == celebration.id => {
                        snapshot.celebration = None;
                        true
                    }
                    _ => false,
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use crate::source::scripted::{ScriptedSource, election};
    use tokio::time::sleep;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn ready(vm: &ResultsViewModel) -> ResultsView {
        match vm.current_state() {
            ViewState::Ready(view) => view,
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    fn failure(vm: &ResultsViewModel) -> LoadFailure {
        match vm.current_state() {
            ViewState::Failed(failure) => failure,
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle_and_becomes_ready() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        assert_eq!(vm.current_state(), ViewState::Idle);

        let source = ScriptedSource::new(vec![(
            ms(10),
            Ok(election(ElectionStatus::Ongoing, &[("Ada", 100), ("Grace", 50)])),
        )]);
        assert_eq!(vm.load(&source).await, LoadOutcome::Applied);

        let view = ready(&vm);
        assert_eq!(view.status, ElectionStatus::Ongoing);
        assert_eq!(view.results.total_votes, 150);
        assert_eq!(view.results.winner.map(|c| c.name), Some("Ada".to_string()));
        assert!(vm.celebration().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn shows_loading_while_fetching() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![(
            ms(100),
            Ok(election(ElectionStatus::Ongoing, &[("Ada", 1)])),
        )]);

        let (outcome, mid_flight) = tokio::join!(vm.load(&source), async {
            sleep(ms(50)).await;
            vm.current_state()
        });

        assert_eq!(mid_flight, ViewState::Loading);
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(matches!(vm.current_state(), ViewState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn latest_load_wins_when_responses_arrive_out_of_order() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![
            (ms(200), Ok(election(ElectionStatus::Ongoing, &[("Ada", 10), ("Grace", 1)]))),
            (ms(20), Ok(election(ElectionStatus::Ongoing, &[("Ada", 3), ("Grace", 40)]))),
        ]);

        let (first, second) = tokio::join!(vm.load(&source), async {
            sleep(ms(5)).await;
            vm.load(&source).await
        });

        assert_eq!(first, LoadOutcome::Superseded);
        assert_eq!(second, LoadOutcome::Applied);

        let view = ready(&vm);
        assert_eq!(view.results.total_votes, 43);
        assert_eq!(view.results.winner.map(|c| c.name), Some("Grace".to_string()));
        assert_eq!(vm.snapshot().request, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_loads_both_apply() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![
            (ms(10), Ok(election(ElectionStatus::Ongoing, &[("Ada", 1)]))),
            (ms(10), Ok(election(ElectionStatus::Ongoing, &[("Ada", 2)]))),
        ]);

        assert_eq!(vm.load(&source).await, LoadOutcome::Applied);
        assert_eq!(vm.load(&source).await, LoadOutcome::Applied);
        assert_eq!(ready(&vm).results.total_votes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failure_is_dismissible() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![(
            ms(10),
            Err(SourceError::Status {
                status: 503,
                url: "http://localhost/elections/e-1/results".to_string(),
            }),
        )]);

        assert_eq!(vm.load(&source).await, LoadOutcome::Applied);
        let failed = failure(&vm);
        assert_eq!(failed.kind, FailureKind::FetchFailed);
        assert_eq!(failed.message, "Could not load election results.");
        assert!(failed.detail.contains("503"));
        assert!(!failed.dismissed);

        assert!(vm.dismiss_error());
        assert!(failure(&vm).dismissed);
        assert!(!vm.dismiss_error());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_does_nothing_outside_failure() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        assert!(!vm.dismiss_error());
        assert_eq!(vm.current_state(), ViewState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn negative_votes_fail_to_compute() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![(
            ms(10),
            Ok(election(ElectionStatus::Completed, &[("Ada", 5), ("Grace", -2)])),
        )]);

        vm.load(&source).await;
        let failed = failure(&vm);
        assert_eq!(failed.kind, FailureKind::InvalidTallyInput);
        assert_eq!(failed.message, "Failed to compute results.");
        assert!(vm.celebration().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn source_side_tally_errors_keep_their_kind() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![
            (ms(1), Err(TallyError::invalid("a", "vote count 1.5 is not a whole number").into())),
            (ms(1), Err(SourceError::MalformedResponse("candidate a has no vote count".into()))),
        ]);

        vm.load(&source).await;
        assert_eq!(failure(&vm).kind, FailureKind::InvalidTallyInput);
        vm.load(&source).await;
        assert_eq!(failure(&vm).kind, FailureKind::MalformedResponse);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_results_render_as_ready() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![(ms(1), Ok(election(ElectionStatus::Completed, &[])))]);

        vm.load(&source).await;
        let view = ready(&vm);
        assert!(view.results.is_empty());
        assert!(view.results.winner.is_none());
        assert!(vm.celebration().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_election_with_winner_celebrates_once() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let mut updates = vm.subscribe();
        let source = ScriptedSource::new(vec![(
            ms(10),
            Ok(election(ElectionStatus::Completed, &[("Ada", 7), ("Grace", 3)])),
        )]);

        vm.load(&source).await;
        let celebration = vm.celebration().expect("winner should be celebrated");
        assert_eq!(celebration.winner.name, "Ada");

        // reading again is not a new celebration
        assert_eq!(vm.celebration().map(|c| c.id), Some(celebration.id));

        updates.borrow_and_update();
        sleep(ms(4_900)).await;
        assert!(vm.celebration().is_some());

        sleep(ms(200)).await;
        assert!(vm.celebration().is_none());
        updates.changed().await.unwrap();
        assert!(updates.borrow().celebration.is_none());
        assert!(matches!(vm.current_state(), ViewState::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn new_winning_load_raises_a_new_celebration() {
        let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
        let source = ScriptedSource::new(vec![
            (ms(1), Ok(election(ElectionStatus::Completed, &[("Ada", 7)]))),
            (ms(1), Ok(election(ElectionStatus::Completed, &[("Ada", 7)]))),
        ]);

        vm.load(&source).await;
        let first = vm.celebration().unwrap();
        vm.load(&source).await;
        let second = vm.celebration().unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test(start_paused = true)]
    async fn no_celebration_without_single_completed_winner() {
        let cases = vec![
            election(ElectionStatus::Ongoing, &[("Ada", 7), ("Grace", 3)]),
            election(ElectionStatus::Completed, &[("Ada", 5), ("Grace", 5)]),
            election(ElectionStatus::Completed, &[("Ada", 0), ("Grace", 0)]),
            election(ElectionStatus::Upcoming, &[("Ada", 0)]),
        ];

        for case in cases {
            let vm = ResultsViewModel::new("e-1", ViewModelSettings::default());
            let source = ScriptedSource::new(vec![(ms(1), Ok(case))]);
            vm.load(&source).await;
            assert!(matches!(vm.current_state(), ViewState::Ready(_)));
            assert!(vm.celebration().is_none());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn celebration_timer_outliving_the_view_is_harmless() {
        let settings = ViewModelSettings {
            celebration_duration: ms(50),
            ..ViewModelSettings::default()
        };
        let vm = ResultsViewModel::new("e-1", settings);
        let source = ScriptedSource::new(vec![(ms(1), Ok(election(ElectionStatus::Completed, &[("Ada", 1)])))]);

        vm.load(&source).await;
        assert!(vm.celebration().is_some());
        drop(vm);
        sleep(ms(100)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn ranking_policy_is_applied() {
        let settings = ViewModelSettings {
            ranking: RankingPolicy::LeadingTieOnly,
            ..ViewModelSettings::default()
        };
        let vm = ResultsViewModel::new("e-1", settings);
        let source = ScriptedSource::new(vec![(
            ms(1),
            Ok(election(ElectionStatus::Ongoing, &[("Ada", 10), ("Grace", 8), ("Alan", 8)])),
        )]);

        vm.load(&source).await;
        let ranks: Vec<usize> = ready(&vm).results.standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }
}
