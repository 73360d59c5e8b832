//! Catalog loading: per-audience config fetch, URL-deduplicated source fetch,
//! definition and entitlement aggregation, and the session that owns the
//! result.
//!
//! Fetches go through a [`JsonFetcher`]; with the default `http` feature
//! [`HttpFetcher`] talks to the real service over reqwest.

pub mod cache;
pub mod config;
pub mod definitions;
pub mod entitlements;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sources;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use cache::{FetchResult, UrlCache};
pub use config::{CatalogConfig, CatalogConfigLoader};
pub use definitions::{AppDefinitionAggregator, MergeReport};
pub use entitlements::EntitlementAggregator;
pub use error::{CatalogError, FetchError, LoadError, SettingsError};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::JsonFetcher;
pub use orchestrator::{CatalogData, CatalogLoadOrchestrator, LoadPhase, LoadSummary, SourceStats};
pub use progress::{
    CompletionSink, NoopSink, ProgressReporter, ProgressSink, StatusKind, TracingSink,
};
pub use session::CatalogSession;
pub use settings::CatalogSettings;
pub use sources::SourceRegistry;

/// Lock an index mutex. A panic while merging leaves the index consistent
/// up to the last completed upsert, so poisoning is ignored.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
