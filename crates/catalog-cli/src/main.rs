mod display;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use catalog_core::reseed_selection;
use catalog_sync::{CatalogSession, CatalogSettings, HttpFetcher, TracingSink};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "catalog", version, about = "Explore the app catalog across audience groups")]
struct Cli {
    /// JSON settings file; flags below override its fields.
    #[arg(long, env = "CATALOG_SETTINGS")]
    settings: Option<PathBuf>,

    /// Config service endpoint, including its fixed query string.
    #[arg(long, env = "CATALOG_ENDPOINT")]
    endpoint: Option<String>,

    /// Audience groups to load (comma separated).
    #[arg(long = "audiences", env = "CATALOG_AUDIENCES", value_delimiter = ',')]
    audiences: Vec<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "CATALOG_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Hide the progress lines.
    #[arg(long, short)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load everything and print catalog statistics.
    Summary {
        /// Print the load summary as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show one app: definition, versions by audience, entitlements.
    App { app_id: String },
    /// List apps, entitled apps first.
    Apps {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Entitlement states across the selected audience groups.
    States {
        /// Restrict the summary to these audience groups (comma separated).
        #[arg(long, value_delimiter = ',')]
        filter: Vec<String>,
        /// List the apps carrying this state instead of the summary.
        #[arg(long)]
        state: Option<String>,
    },
    /// Data sources and the audience groups that reference them.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings(&cli)?;
    tracing::info!(
        "catalog v{} ({} audience groups)",
        env!("CARGO_PKG_VERSION"),
        settings.audience_groups.len()
    );

    let fetcher = HttpFetcher::new(settings.timeout(), settings.user_agent.as_deref())
        .context("building HTTP client")?;
    let progress: Arc<dyn catalog_sync::ProgressSink> = if cli.quiet {
        Arc::new(catalog_sync::NoopSink)
    } else {
        Arc::new(display::ConsoleProgress)
    };
    let mut session =
        CatalogSession::new(settings, Arc::new(fetcher), progress, Arc::new(TracingSink));
    let summary = session
        .load_all_catalog_configurations()
        .await
        .context("loading catalog")?;

    match cli.command {
        Command::Summary { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                display::print_summary(&summary);
            }
        }
        Command::App { app_id } => display::print_app_card(&session, &app_id),
        Command::Apps { limit } => display::print_app_list(&session.list_apps(), limit),
        Command::States { filter, state } => match state {
            Some(state) => display::print_state_apps(&state, &session.state_apps(&state)),
            None => {
                let discovered = session.compute_audience_groups();
                let requested: BTreeSet<String> = filter.into_iter().collect();
                let selected = reseed_selection(&requested, &discovered);
                if !requested.is_empty() && selected != requested {
                    eprintln!("No loaded audience group matches the filter; showing all.");
                }
                display::print_states(
                    &selected,
                    &session.analyze_entitlement_states(&selected),
                );
            }
        },
        Command::Sources => display::print_sources(session.sources()),
    }

    Ok(())
}

fn settings(cli: &Cli) -> anyhow::Result<CatalogSettings> {
    let mut settings = match &cli.settings {
        Some(path) => CatalogSettings::from_json_file(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => CatalogSettings::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        settings.config_endpoint = endpoint.clone();
    }
    if !cli.audiences.is_empty() {
        settings.audience_groups = cli.audiences.clone();
    }
    if let Some(timeout) = cli.timeout_secs {
        settings.timeout_secs = timeout;
    }
    Ok(settings)
}
