//! Plain-text rendering for the catalog explorer.
//!
//! An app renders as a vertical card grouped into sections; states and
//! sources render as simple aligned tables.

use std::collections::{BTreeMap, BTreeSet};

use catalog_core::{AppDefinition, audience_shorthand, state_description};
use catalog_store::{AppListing, StateApp, StateSummary};
use catalog_sync::{
    CatalogSession, LoadPhase, LoadSummary, ProgressSink, SourceRegistry, StatusKind,
};

const MAX_LIST_ITEMS: usize = 10;
const MAX_TEXT: usize = 100;

/// Progress lines on stderr.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_progress(&self, message: &str, percent: u8) {
        eprintln!("[{percent:>3}%] {message}");
    }

    fn on_status(&self, message: &str, kind: StatusKind) {
        match kind {
            StatusKind::Warning => eprintln!("  warning: {message}"),
            StatusKind::Error => eprintln!("  error: {message}"),
            StatusKind::Info | StatusKind::Success => eprintln!("  {message}"),
        }
    }

    fn on_phase(&self, phase: LoadPhase) {
        tracing::debug!(?phase, "phase");
    }
}

// ── Summary ──

pub fn print_summary(summary: &LoadSummary) {
    println!("=== App Catalog ===");
    println!(
        "  {:<26} {}",
        "loaded at",
        summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  {:<26} {}",
        "audience groups",
        audience_labels(summary.loaded_audience_groups.iter().map(String::as_str))
    );
    for (audience_group, err) in &summary.failed_audience_groups {
        println!("  {:<26} {err}", format!("failed: {audience_group}"));
    }
    println!();

    println!("Catalog");
    println!("  {:<26} {}", "unique apps", summary.stats.unique_apps);
    println!("  {:<26} {}", "app definitions", summary.stats.definitions);
    println!(
        "  {:<26} {}",
        "apps with entitlements", summary.stats.apps_with_entitlements
    );
    println!("  {:<26} {}", "entitlements", summary.stats.entitlements);
    println!();

    println!("Sources");
    println!("  {:<26} {}", "unique sources", summary.sources.total);
    println!("  {:<26} {}", "loaded", summary.sources.loaded);
    if summary.sources.failed > 0 {
        println!("  {:<26} {}", "failed", summary.sources.failed);
    }
    println!("  {:<26} {}", "requests saved", summary.sources.saved_requests);
    if summary.definitions.skipped + summary.entitlements.skipped > 0 {
        println!(
            "  {:<26} {}",
            "records skipped",
            summary.definitions.skipped + summary.entitlements.skipped
        );
    }
    if summary.entitlements.dangling > 0 {
        println!(
            "  {:<26} {}",
            "dangling entitlements", summary.entitlements.dangling
        );
    }
}

// ── App card ──

/// Print one app as a card: identity, capabilities, versions, entitlements.
pub fn print_app_card(session: &CatalogSession, app_id: &str) {
    let app = session.app_info(app_id);
    println!("=== {} ===", app.display_name());
    if let Some(text) = app.short_description.as_deref().or(app.description.as_deref()) {
        println!("{}", truncate(text, MAX_TEXT));
    }
    println!();

    print_identity(&app);

    let badges = app.capability_badges();
    println!("Capabilities");
    println!("  {}", badges.join(", "));
    println!();

    print_list("Categories", app.categories.as_deref());
    print_list("Industries", app.industries.as_deref());

    let versions = session.apps().version_groups(app_id);
    if !versions.is_empty() {
        println!("Versions");
        for group in &versions {
            let sources: Vec<&str> = group.source_types.iter().map(|s| s.as_str()).collect();
            println!(
                "  {:<26} {}  [{}]",
                group.version.unwrap_or("N/A"),
                audience_labels(group.audiences.iter().copied()),
                sources.join(", ")
            );
        }
        println!();
    }

    if let Some(entitlements) = session.app_preconfigured_entitlements(app_id) {
        println!("Preconfigured Entitlements ({})", entitlements.len());
        for (key, entitlement) in entitlements.iter().take(MAX_LIST_ITEMS * 3) {
            let state = entitlement.state_or_unspecified();
            match state_description(state) {
                Some(description) => println!("  {:<26} {state} ({description})", key.as_str()),
                None => println!("  {:<26} {state}", key.as_str()),
            }
        }
        if entitlements.len() > MAX_LIST_ITEMS * 3 {
            println!("  ... and {} more", entitlements.len() - MAX_LIST_ITEMS * 3);
        }
        println!();
    }
}

fn print_identity(app: &AppDefinition) {
    println!("Identity");
    println!("  {:<26} {}", "id", app.id);
    let fields = [
        ("developer", app.developer_name.as_deref()),
        ("developer url", app.developer_url.as_deref()),
        ("version", app.version.as_deref()),
        ("manifest version", app.manifest_version.as_deref()),
        ("office asset id", app.office_asset_id.as_deref()),
    ];
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {label:<26} {value}");
        }
    }
    match app.last_updated() {
        Some(ts) => println!("  {:<26} {}", "last updated", ts.format("%Y-%m-%d")),
        None => {
            if let Some(raw) = app.last_updated_at.as_deref() {
                println!("  {:<26} {raw}", "last updated");
            }
        }
    }
    println!();
}

fn print_list(header: &str, items: Option<&[String]>) {
    let Some(items) = items.filter(|i| !i.is_empty()) else {
        return;
    };
    println!("{header}");
    println!("  {}", items.join(", "));
    println!();
}

// ── App listing ──

pub fn print_app_list(listing: &[AppListing<'_>], limit: usize) {
    println!(
        "{:<40} {:<28} {:>9}  {}",
        "APP", "DEVELOPER", "AUDIENCES", "ENTITLED"
    );
    for row in listing.iter().take(limit) {
        println!(
            "{:<40} {:<28} {:>9}  {}",
            truncate(row.definition.display_name(), 40),
            truncate(
                row.definition.developer_name.as_deref().unwrap_or("-"),
                28
            ),
            row.audience_count,
            if row.has_entitlements { "yes" } else { "" }
        );
    }
    if listing.len() > limit {
        println!("... and {} more", listing.len() - limit);
    }
}

// ── States ──

pub fn print_states(selected: &BTreeSet<String>, states: &BTreeMap<String, StateSummary>) {
    println!(
        "Entitlement states for {}",
        audience_labels(selected.iter().map(String::as_str))
    );
    println!();
    if states.is_empty() {
        println!("  (no preconfigured entitlements)");
        return;
    }
    let mut rows: Vec<_> = states.iter().collect();
    rows.sort_by(|a, b| b.1.apps.len().cmp(&a.1.apps.len()).then_with(|| a.0.cmp(b.0)));
    for (state, summary) in rows {
        println!(
            "  {:<26} {:>5} apps  {}",
            state,
            summary.apps.len(),
            audience_labels(summary.audiences.iter().map(String::as_str))
        );
        if let Some(description) = state_description(state) {
            println!("  {:<26} {description}", "");
        }
    }
}

pub fn print_state_apps(state: &str, apps: &[StateApp<'_>]) {
    println!("{state} ({} apps)", apps.len());
    if let Some(description) = state_description(state) {
        println!("{description}");
    }
    println!();
    for app in apps {
        let name = app.definition.map_or(app.app_id, AppDefinition::display_name);
        println!(
            "  {:<40} {}",
            truncate(name, 40),
            audience_labels(app.audiences.iter().copied())
        );
    }
}

// ── Sources ──

pub fn print_sources(sources: &SourceRegistry) {
    println!(
        "{} unique sources, {} references, {} requests saved",
        sources.len(),
        sources.referenced_requests(),
        sources.saved_requests()
    );
    println!();
    for (url, audiences) in sources.iter() {
        println!("{url}");
        println!(
            "  {}",
            audience_labels(audiences.iter().map(String::as_str))
        );
    }
}

// ── Helpers ──

/// `R0 (ring0), R4 (general)`; groups without a shorthand print bare.
fn audience_labels<'a>(audiences: impl Iterator<Item = &'a str>) -> String {
    audiences
        .map(|group| {
            let short = audience_shorthand(group);
            if short == group {
                group.to_string()
            } else {
                format!("{short} ({group})")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
