use log::{error, info, warn};
use std::sync::Arc;
use tally_board::config::Config;
use tally_board::source::{HttpResultsSource, ResultsSource};
use tally_board::tasks::RefreshTask;
use tally_board::viewmodel::{ResultsViewModel, ViewModelSettings, ViewSnapshot, ViewState};
use uuid::Uuid;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let source: Arc<dyn ResultsSource> = match HttpResultsSource::new(&config) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Failed to set up results client: {}", e);
            return;
        }
    };

    let settings = ViewModelSettings {
        celebration_duration: config.celebration_duration,
        ..ViewModelSettings::default()
    };
    let view_model = Arc::new(ResultsViewModel::new(config.election_id.clone(), settings));
    let mut updates = view_model.subscribe();
    let refresh = RefreshTask::start(Arc::clone(&view_model), source, config.refresh_interval);

    let mut last_state: Option<ViewState> = None;
    let mut last_celebration: Option<Uuid> = None;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                render(&snapshot, &mut last_state, &mut last_celebration);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping results watcher.");
                break;
            }
        }
    }

    refresh.cancel();
}

fn render(snapshot: &ViewSnapshot, last_state: &mut Option<ViewState>, last_celebration: &mut Option<Uuid>) {
    if last_state.as_ref() != Some(&snapshot.state) {
        match &snapshot.state {
            ViewState::Idle => {}
            ViewState::Loading => info!("Loading results (request #{})...", snapshot.request),
            ViewState::Ready(view) => {
                let title = view.title.as_deref().unwrap_or(&view.election_id);
                println!(
                    "{} [{}] as of {}\n{}\n",
                    title,
                    view.status,
                    view.fetched_at.to_rfc3339(),
                    view.results.summary()
                );
            }
            ViewState::Failed(failure) if !failure.dismissed => {
                warn!("{} ({})", failure.message, failure.detail);
            }
            ViewState::Failed(_) => {}
        }
        *last_state = Some(snapshot.state.clone());
    }

    if let Some(celebration) = &snapshot.celebration {
        if *last_celebration != Some(celebration.id) {
            println!("Congratulations to {}, the winner!", celebration.winner.name);
            *last_celebration = Some(celebration.id);
        }
    }
}
