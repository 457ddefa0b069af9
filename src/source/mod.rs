#[cfg(test)]
pub(crate) mod scripted;

use crate::config::Config;
use crate::error::{ConfigError, SourceError};
use crate::models::wire::parse_results;
use crate::models::Election;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Client, Url};

/// Anything that can produce the current candidate tallies for an election.
#[async_trait]
pub trait ResultsSource: Send + Sync {
    async fn fetch_results(&self, election_id: &str) -> Result<Election, SourceError>;
}

/// Reads results from the voting backend's REST API:
/// `GET {base}/elections/{id}/results`.
pub struct HttpResultsSource {
    client: Client,
    base_url: Url,
}

impl HttpResultsSource {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.results_base_url).map_err(|e| ConfigError::Invalid {
            key: "RESULTS_BASE_URL",
            value: config.results_base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                key: "RESULTS_BASE_URL",
                value: config.results_base_url.clone(),
                reason: "url cannot carry a path".to_string(),
            });
        }

        let client = Client::builder().timeout(config.http_timeout).build()?;

        Ok(Self { client, base_url })
    }

    pub fn results_url(&self, election_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["elections", election_id, "results"]);
        }
        url
    }
}

#[async_trait]
impl ResultsSource for HttpResultsSource {
    async fn fetch_results(&self, election_id: &str) -> Result<Election, SourceError> {
        let url = self.results_url(election_id);
        debug!("Fetching results from {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Results request to {} answered {}", url, status);
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        parse_results(&body, election_id)
    }
}
