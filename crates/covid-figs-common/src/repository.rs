//! Client for the public data repository hosting the CSV feeds
//!
//! Two endpoints are used: the commits API, filtered to a file path, to learn
//! when the file last changed, and the raw content host to download it.
//! Requests are issued once; failures propagate to the caller.

use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{FigsError, Result};
use crate::types::LastModified;

/// Configuration for the repository client
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Repository identifier, `owner/name`
    pub repo: String,
    /// Base URL of the commits API (e.g., "https://api.github.com")
    pub api_base_url: String,
    /// Base URL of the raw content host (e.g., "https://raw.githubusercontent.com")
    pub raw_base_url: String,
    /// Branch the CSV files are read from
    pub branch: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Zone last-modified timestamps are converted to
    pub timezone: Tz,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            repo: "pcm-dpc/COVID-19".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            branch: "master".to_string(),
            user_agent: concat!("covid-figs/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            timezone: chrono_tz::Europe::Rome,
        }
    }
}

impl RepositoryConfig {
    /// Create a configuration for the given repository with default hosts
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            ..Default::default()
        }
    }

    /// Point both endpoints at the same base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.api_base_url.clone_from(&base_url);
        self.raw_base_url = base_url;
        self
    }

    /// Set the branch files are downloaded from
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the display time zone
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    committer: CommitSignature,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: String,
}

/// HTTP client for the upstream data repository
#[derive(Debug, Clone)]
pub struct RepositoryClient {
    client: Client,
    config: RepositoryConfig,
}

impl RepositoryClient {
    /// Create a new client with the given configuration
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FigsError::network_with_source("Failed to create HTTP client", e))?;

        Ok(Self { client, config })
    }

    /// Repository configuration in use
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// URL of the commit-history query for `path`, newest commit only
    pub fn commit_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/commits?path={}&page=1&per_page=1",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.repo,
            path
        )
    }

    /// URL of the raw file content for `path`
    pub fn data_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.raw_base_url.trim_end_matches('/'),
            self.config.repo,
            self.config.branch,
            path.trim_start_matches('/')
        )
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!("Sending request to: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FigsError::network_with_status(
                format!("{url} returned {status}"),
                status.as_u16(),
            ));
        }
        Ok(response)
    }

    /// Timestamp of the most recent commit touching `path`, in the display zone
    #[instrument(skip(self), fields(repo = %self.config.repo))]
    pub async fn last_modified(&self, path: &str) -> Result<LastModified> {
        let response = self.get(&self.commit_url(path)).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FigsError::network_with_source("Failed to read commit history", e))?;
        let commits: Vec<CommitEntry> = serde_json::from_str(&body)?;

        let latest = commits.into_iter().next().ok_or_else(|| {
            FigsError::source_data(format!("No commits found for path '{path}'"))
        })?;

        let committed = DateTime::parse_from_rfc3339(&latest.commit.committer.date).map_err(|e| {
            FigsError::source_data_with_source(
                format!("Invalid commit date '{}'", latest.commit.committer.date),
                e,
            )
        })?;

        let local = committed.with_timezone(&self.config.timezone);
        info!(%local, "Resolved last modification of {}", path);
        Ok(local)
    }

    /// Raw text content of `path` on the configured branch
    #[instrument(skip(self), fields(repo = %self.config.repo))]
    pub async fn download(&self, path: &str) -> Result<String> {
        let response = self.get(&self.data_url(path)).await?;
        let text = response
            .text()
            .await
            .map_err(|e| FigsError::network_with_source("Failed to read file content", e))?;
        info!(bytes = text.len(), "Downloaded {}", path);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const PATH: &str = "dati-regioni/dpc-covid19-ita-regioni.csv";

    fn client_for(server: &MockServer) -> RepositoryClient {
        RepositoryClient::new(RepositoryConfig::default().with_base_url(server.base_url())).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = RepositoryClient::new(RepositoryConfig::default()).unwrap();
        assert_eq!(
            client.commit_url(PATH),
            "https://api.github.com/repos/pcm-dpc/COVID-19/commits?path=dati-regioni/dpc-covid19-ita-regioni.csv&page=1&per_page=1"
        );
        assert_eq!(
            client.data_url(PATH),
            "https://raw.githubusercontent.com/pcm-dpc/COVID-19/master/dati-regioni/dpc-covid19-ita-regioni.csv"
        );
    }

    #[tokio::test]
    async fn test_last_modified_converts_to_display_zone() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/pcm-dpc/COVID-19/commits")
                .query_param("path", PATH)
                .query_param("per_page", "1");
            then.status(200).header("content-type", "application/json").body(
                r#"[{"sha":"abc","commit":{"committer":{"name":"x","date":"2020-03-20T17:03:12Z"}}},
                    {"sha":"def","commit":{"committer":{"name":"x","date":"2020-03-19T17:00:00Z"}}}]"#,
            );
        });

        let last_modified = client_for(&server).last_modified(PATH).await.unwrap();

        mock.assert();
        assert_eq!(
            last_modified.to_rfc3339(),
            "2020-03-20T18:03:12+01:00"
        );
    }

    #[tokio::test]
    async fn test_empty_history_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/pcm-dpc/COVID-19/commits");
            then.status(200).body("[]");
        });

        let err = client_for(&server).last_modified(PATH).await.unwrap_err();
        assert!(matches!(err, FigsError::Source { .. }));
    }

    #[tokio::test]
    async fn test_download_non_success_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(format!("/pcm-dpc/COVID-19/master/{PATH}"));
            then.status(404).body("404: Not Found");
        });

        let err = client_for(&server).download(PATH).await.unwrap_err();
        assert!(matches!(
            err,
            FigsError::Network {
                status_code: Some(404),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_download_returns_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(format!("/pcm-dpc/COVID-19/master/{PATH}"));
            then.status(200).body("data,totale_casi\n2020-03-01T18:00:00,10\n");
        });

        let body = client_for(&server).download(PATH).await.unwrap();
        assert!(body.starts_with("data,totale_casi"));
    }
}
