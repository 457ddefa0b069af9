use crate::source::ResultsSource;
use crate::viewmodel::{LoadOutcome, ResultsViewModel};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Periodic re-fetch for a mounted results view.
pub struct RefreshTask;

/// Owned by the hosting view; dropping it stops the refresh loop.
pub struct RefreshHandle {
    task: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Loads immediately, then again on every `period`. A load still in
    /// flight when the handle is cancelled is abandoned.
    pub fn start(
        view_model: Arc<ResultsViewModel>,
        source: Arc<dyn ResultsSource>,
        period: Duration,
    ) -> RefreshHandle {
        info!(
            "Refreshing results for election {} every {:?}",
            view_model.election_id(),
            period
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match view_model.load(source.as_ref()).await {
                    LoadOutcome::Applied => {}
                    LoadOutcome::Superseded => {
                        debug!("Refresh of election {} was superseded", view_model.election_id())
                    }
                }
            }
        });

        RefreshHandle { task: Some(task) }
    }
}

impl RefreshHandle {
    pub fn cancel(mut self) {
        self.abort();
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
