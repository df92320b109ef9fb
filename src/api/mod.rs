//! Azure DevOps REST access: entity records, the fetcher trait and its HTTP
//! implementation.

mod client;
mod error;
mod fetcher;
mod types;

pub use client::{AzureDevOpsClient, API_VERSION};
pub use error::FetchError;
pub use fetcher::SnapshotFetcher;
pub use types::*;
