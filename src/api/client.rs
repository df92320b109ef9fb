//! HTTP snapshot fetcher for the Azure DevOps REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiList, FetchError, PullRequest, Repository, SnapshotFetcher, Thread};

/// REST API version sent with every request.
pub const API_VERSION: &str = "7.1";

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("review-watch/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(FetchError::Client)
}

/// Fetches snapshots from `{base_url}/git/...` using basic authentication with
/// a personal access token.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    client: Client,
    base_url: Url,
    user: String,
    token: String,
}

impl AzureDevOpsClient {
    /// Create a client for an API base such as
    /// `https://dev.azure.com/{organization}/{project}/_apis`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or cannot carry a path,
    /// or if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|_| FetchError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client: build_http_client()?,
            base_url,
            user: user.into(),
            token: token.into(),
        })
    }

    /// API base for a hosted organization and project.
    #[must_use]
    pub fn hosted_base_url(organization: &str, project: &str) -> String {
        format!("https://dev.azure.com/{organization}/{project}/_apis")
    }

    /// The API base this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the URL of `base_url/segments...?api-version=...`.
    fn endpoint<I>(&self, segments: I) -> Result<Url, FetchError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    fn pull_request_segments(repository: &Repository, pull_request_id: u64) -> Vec<String> {
        vec![
            "git".to_string(),
            "repositories".to_string(),
            repository.id.clone(),
            "pullRequests".to_string(),
            pull_request_id.to_string(),
        ]
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        tracing::trace!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(FetchError::Request)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SnapshotFetcher for AzureDevOpsClient {
    async fn repositories(&self) -> Result<Vec<Repository>, FetchError> {
        let url = self.endpoint(["git", "repositories"])?;
        let list: ApiList<Repository> = self.get(url).await?;
        Ok(list.value)
    }

    async fn pull_requests(
        &self,
        repository: &Repository,
    ) -> Result<Vec<PullRequest>, FetchError> {
        let url = self.endpoint(["git", "repositories", repository.id.as_str(), "pullRequests"])?;
        let list: ApiList<PullRequest> = self.get(url).await?;
        Ok(list.value)
    }

    async fn pull_request(
        &self,
        repository: &Repository,
        pull_request_id: u64,
    ) -> Result<PullRequest, FetchError> {
        let url = self.endpoint(Self::pull_request_segments(repository, pull_request_id))?;
        self.get(url).await
    }

    async fn threads(
        &self,
        repository: &Repository,
        pull_request_id: u64,
    ) -> Result<Vec<Thread>, FetchError> {
        let mut segments = Self::pull_request_segments(repository, pull_request_id);
        segments.push("threads".to_string());
        let url = self.endpoint(segments)?;
        let list: ApiList<Thread> = self.get(url).await?;
        Ok(list.value)
    }
}
