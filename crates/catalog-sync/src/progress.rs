//! Progress, status and completion reporting.
//!
//! Presentation code implements [`ProgressSink`] and [`CompletionSink`] and
//! hands them to the session; the loader never calls back into UI code any
//! other way.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use catalog_store::CatalogStats;
use tracing::{error, info, warn};

use crate::LoadPhase;

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// Receives load progress. Percentages are non-decreasing within one pass.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, message: &str, percent: u8);

    fn on_status(&self, _message: &str, _kind: StatusKind) {}

    fn on_phase(&self, _phase: LoadPhase) {}
}

/// Receives end-of-load notifications.
pub trait CompletionSink: Send + Sync {
    fn on_stats_changed(&self, _stats: &CatalogStats) {}

    fn on_load_finished(&self) {}

    fn on_initial_display_ready(&self) {}
}

/// Sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_progress(&self, _message: &str, _percent: u8) {}
}

impl CompletionSink for NoopSink {}

/// Sink that writes everything to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_progress(&self, message: &str, percent: u8) {
        info!(percent, "{message}");
    }

    fn on_status(&self, message: &str, kind: StatusKind) {
        match kind {
            StatusKind::Info | StatusKind::Success => info!(?kind, "{message}"),
            StatusKind::Warning => warn!("{message}"),
            StatusKind::Error => error!("{message}"),
        }
    }

    fn on_phase(&self, phase: LoadPhase) {
        info!(?phase, "load phase");
    }
}

impl CompletionSink for TracingSink {
    fn on_stats_changed(&self, stats: &CatalogStats) {
        info!(
            unique_apps = stats.unique_apps,
            definitions = stats.definitions,
            apps_with_entitlements = stats.apps_with_entitlements,
            entitlements = stats.entitlements,
            "catalog stats"
        );
    }

    fn on_load_finished(&self) {
        info!("catalog load finished");
    }
}

/// Wraps a [`ProgressSink`] and keeps reported percentages monotonic.
///
/// Several producers report concurrently (per-source fetch completions and
/// per-audience phase completions), each from its own band. The reporter
/// forwards `max(previous, requested)` so the sink never sees progress go
/// backwards until [`reset`](Self::reset).
pub struct ProgressReporter {
    sink: Arc<dyn ProgressSink>,
    high_water: AtomicU8,
}

impl ProgressReporter {
    pub fn new(sink: Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            high_water: AtomicU8::new(0),
        }
    }

    /// Report progress; returns the percentage actually forwarded.
    pub fn report(&self, message: &str, percent: u8) -> u8 {
        let percent = percent.min(100);
        let shown = self.high_water.fetch_max(percent, Ordering::SeqCst).max(percent);
        self.sink.on_progress(message, shown);
        shown
    }

    pub fn status(&self, message: &str, kind: StatusKind) {
        self.sink.on_status(message, kind);
    }

    pub fn phase(&self, phase: LoadPhase) {
        self.sink.on_phase(phase);
    }

    /// Highest percentage reported since the last reset.
    pub fn current(&self) -> u8 {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.high_water.store(0, Ordering::SeqCst);
    }
}

/// Percentage `from + span * done / total`, rounded down.
pub(crate) fn band(from: u8, span: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return from.saturating_add(span);
    }
    let step = (span as usize * done.min(total)) / total;
    from.saturating_add(step as u8)
}
