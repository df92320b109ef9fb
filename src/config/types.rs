//! Configuration types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::AzureDevOpsClient;

use super::ConfigError;

/// How review events are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Colored one-line summaries on stdout.
    #[default]
    Text,
    /// One JSON object per line on stdout.
    Json,
    /// Structured tracing records on stderr.
    Log,
}

/// Configuration as read from a TOML file. Every field is optional in the
/// file; required ones are checked by [`WatchConfig::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Azure DevOps organization.
    pub organization: Option<String>,
    /// Project name or id within the organization.
    pub project: Option<String>,
    /// User to authenticate as.
    pub user: Option<String>,
    /// File holding a personal access token.
    pub token_path: Option<PathBuf>,
    /// Full API base, replacing the one derived from organization and project.
    pub api_url: Option<String>,
    /// Unique names of users of interest; empty watches every pull request.
    pub users: Vec<String>,
    /// Names of repositories of interest; empty watches every repository.
    pub repositories: Vec<String>,
    /// Poll interval in seconds.
    pub interval_secs: u64,
    pub format: OutputFormat,
    /// Cap on concurrently running watcher ticks; unset means unbounded.
    pub max_watchers: Option<usize>,
}

fn default_interval_secs() -> u64 {
    10
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            user: None,
            token_path: None,
            api_url: None,
            users: Vec::new(),
            repositories: Vec::new(),
            interval_secs: default_interval_secs(),
            format: OutputFormat::default(),
            max_watchers: None,
        }
    }
}

/// Values given on the command line; set fields win over the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub organization: Option<String>,
    pub project: Option<String>,
    pub user: Option<String>,
    pub token_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub users: Option<Vec<String>>,
    pub repositories: Option<Vec<String>>,
    pub interval_secs: Option<u64>,
    pub format: Option<OutputFormat>,
    pub max_watchers: Option<usize>,
}

impl WatchConfig {
    /// Apply command line overrides.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        fn set<T>(field: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *field = value;
            }
        }

        set(&mut self.organization, overrides.organization.map(Some));
        set(&mut self.project, overrides.project.map(Some));
        set(&mut self.user, overrides.user.map(Some));
        set(&mut self.token_path, overrides.token_path.map(Some));
        set(&mut self.api_url, overrides.api_url.map(Some));
        set(&mut self.users, overrides.users);
        set(&mut self.repositories, overrides.repositories);
        set(&mut self.interval_secs, overrides.interval_secs);
        set(&mut self.format, overrides.format);
        set(&mut self.max_watchers, overrides.max_watchers.map(Some));
        self
    }

    /// Check required fields and read the access token.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing, the interval is zero,
    /// or the token file cannot be read or is empty.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let user = self.user.ok_or(ConfigError::MissingField("user"))?;
        let token_path = self
            .token_path
            .ok_or(ConfigError::MissingField("token_path"))?;

        let api_url = match self.api_url {
            Some(api_url) => api_url,
            None => {
                let organization = self
                    .organization
                    .ok_or(ConfigError::MissingField("organization"))?;
                let project = self.project.ok_or(ConfigError::MissingField("project"))?;
                AzureDevOpsClient::hosted_base_url(&organization, &project)
            }
        };

        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let token = std::fs::read_to_string(&token_path)
            .map_err(|e| ConfigError::TokenReadError {
                path: token_path.clone(),
                source: e,
            })?
            .trim()
            .to_string();
        if token.is_empty() {
            return Err(ConfigError::EmptyToken(token_path));
        }

        Ok(ResolvedConfig {
            api_url,
            user,
            token,
            users: clean_list(self.users),
            repositories: clean_list(self.repositories),
            interval: Duration::from_secs(self.interval_secs),
            format: self.format,
            max_watchers: self.max_watchers,
        })
    }
}

/// Drop blank entries left by splitting `""` or `"a,,b"`.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Fully validated settings the watchers run with.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub user: String,
    pub token: String,
    pub users: Vec<String>,
    pub repositories: Vec<String>,
    pub interval: Duration,
    pub format: OutputFormat,
    pub max_watchers: Option<usize>,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_url", &self.api_url)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("users", &self.users)
            .field("repositories", &self.repositories)
            .field("interval", &self.interval)
            .field("format", &self.format)
            .field("max_watchers", &self.max_watchers)
            .finish()
    }
}
