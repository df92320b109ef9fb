//! Review Watch - report Azure DevOps pull request activity as it happens.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use review_watch::api::{AzureDevOpsClient, FetchError};
use review_watch::config::{ConfigError, ConfigLoader, ConfigOverrides, OutputFormat, ResolvedConfig};
use review_watch::display::ConsoleSink;
use review_watch::watcher::{
    BoundedSpawner, EventSink, JsonSink, RootSupervisor, SupervisorError, TaskSpawner,
    TokioSpawner, TracingSink, WatchContext,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
    Log,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Log => OutputFormat::Log,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "review-watch",
    about = "Watch Azure DevOps pull requests and report review activity",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ./.review-watch.toml, then ~/.config/review-watch/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Organization on Azure DevOps.
    #[arg(long)]
    organization: Option<String>,

    /// Project on Azure DevOps.
    #[arg(long)]
    project: Option<String>,

    /// User to log in with.
    #[arg(long)]
    user: Option<String>,

    /// File containing a personal access token.
    #[arg(long)]
    token_path: Option<PathBuf>,

    /// Full API base URL, replacing the one built from organization and project.
    #[arg(long)]
    api_url: Option<String>,

    /// Users of interest (comma separated). Pull requests whose creator or a
    /// reviewer matches one of them are watched. Empty watches all.
    #[arg(long, value_delimiter = ',')]
    users: Option<Vec<String>>,

    /// Repositories of interest (comma separated). Empty watches all.
    #[arg(long, value_delimiter = ',')]
    repositories: Option<Vec<String>>,

    /// Poll interval in seconds.
    #[arg(short, long)]
    interval: Option<u64>,

    /// Output format for review events.
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Cap on watchers polling at the same moment.
    #[arg(long)]
    max_watchers: Option<usize>,

    /// Do not truncate long comments and descriptions.
    #[arg(long)]
    raw: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            organization: self.organization.clone(),
            project: self.project.clone(),
            user: self.user.clone(),
            token_path: self.token_path.clone(),
            api_url: self.api_url.clone(),
            users: self.users.clone(),
            repositories: self.repositories.clone(),
            interval_secs: self.interval,
            format: self.format.map(Into::into),
            max_watchers: self.max_watchers,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Client(#[from] FetchError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn build_sink(format: OutputFormat, raw_mode: bool) -> Arc<dyn EventSink> {
    match format {
        OutputFormat::Text => Arc::new(ConsoleSink::new(raw_mode)),
        OutputFormat::Json => Arc::new(JsonSink),
        OutputFormat::Log => Arc::new(TracingSink),
    }
}

fn build_spawner(max_watchers: Option<usize>) -> Arc<dyn TaskSpawner> {
    match max_watchers {
        Some(limit) => Arc::new(BoundedSpawner::new(limit)),
        None => Arc::new(TokioSpawner::new()),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let loaded = loader.load()?;
    match &loaded.path {
        Some(path) => tracing::info!(path = %path.display(), "Loaded config file"),
        None => tracing::debug!("No config file, using command line settings"),
    }
    let config: ResolvedConfig = loaded.config.with_overrides(cli.overrides()).resolve()?;

    tracing::info!(
        api_url = %config.api_url,
        user = %config.user,
        users = ?config.users,
        repositories = ?config.repositories,
        interval_secs = config.interval.as_secs(),
        "Starting review watch"
    );

    let client = AzureDevOpsClient::new(&config.api_url, &config.user, &config.token)?;
    let ctx = WatchContext::new(
        Arc::new(client),
        build_sink(config.format, cli.raw),
        build_spawner(config.max_watchers),
        config.interval,
        config.users,
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        on_signal.cancel();
    });

    RootSupervisor::new(ctx, config.repositories)
        .run(cancel)
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Review watch failed");
            ExitCode::FAILURE
        }
    }
}
