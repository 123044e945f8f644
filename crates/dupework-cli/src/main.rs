use std::io::Write;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dupework_core::config_file::{ConfigFile, load_config};
use dupework_core::fetch::DEFAULT_TIMEOUT;
use dupework_core::openlibrary::DEFAULT_BASE_URL;
use dupework_core::session::{Session, SessionConfig, Visit};
use dupework_core::{AuthorId, MatchConfig, OpenLibrary, ResilientFetcher};

mod output;

use output::ColorMode;

/// Find likely duplicate works in Open Library author catalogs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inspect a single author's works for likely duplicates
    Inspect {
        /// Author id, e.g. OL1394244A
        author_id: String,

        #[command(flatten)]
        common: CommonOpts,
    },

    /// Walk author ids until one with duplicate groups turns up
    Autopilot {
        /// Author id to start from; the walk begins one step away
        from: String,

        /// Walk direction
        #[arg(long, value_enum, default_value_t = DirectionArg::Next)]
        direction: DirectionArg,

        /// Bound on automatic visits before giving up
        #[arg(long)]
        max_visits: Option<usize>,

        /// Pause between automatic visits, in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,

        #[command(flatten)]
        common: CommonOpts,
    },
}

#[derive(Args, Debug)]
struct CommonOpts {
    /// Don't fold subtitles into the title comparison
    #[arg(long)]
    no_subtitles: bool,

    /// Skip punctuation and stop-word stripping
    #[arg(long)]
    no_aggressive: bool,

    /// Emit the final report as JSON
    #[arg(long)]
    json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Override the upstream base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DirectionArg {
    Next,
    Previous,
    Random,
}

// TODO: accept a full openlibrary.org author URL here, not just the bare id.
fn parse_author_id(raw: &str) -> anyhow::Result<AuthorId> {
    AuthorId::parse(raw).map_err(Into::into)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config();

    match cli.command {
        Command::Inspect { author_id, common } => {
            let id = parse_author_id(&author_id)?;
            let session_config = SessionConfig {
                search_until_similarity: false,
                ..resolve_session_config(&config, &common, None, None)
            };
            let mut session = build_session(&config, &common, id, session_config);
            wire_ctrl_c(&session);

            let outcome = session.go_to(id).await?;
            report(outcome.as_ref(), &common)
        }

        Command::Autopilot {
            from,
            direction,
            max_visits,
            delay_ms,
            common,
        } => {
            let start = parse_author_id(&from)?;
            let session_config = resolve_session_config(&config, &common, max_visits, delay_ms);
            let mut session = build_session(&config, &common, start, session_config);
            wire_ctrl_c(&session);

            let outcome = match direction {
                DirectionArg::Next => session.go_next().await?,
                DirectionArg::Previous => session.go_previous().await?,
                DirectionArg::Random => session.go_random().await?,
            };
            report(outcome.as_ref(), &common)
        }
    }
}

/// Resolve session settings: CLI flags > config file > defaults.
fn resolve_session_config(
    config: &ConfigFile,
    common: &CommonOpts,
    max_visits: Option<usize>,
    delay_ms: Option<u64>,
) -> SessionConfig {
    let defaults = SessionConfig::default();
    let matching = config.matching.clone().unwrap_or_default();
    let traversal = config.traversal.clone().unwrap_or_default();
    let network = config.network.clone().unwrap_or_default();

    SessionConfig {
        match_config: MatchConfig {
            include_subtitles: !common.no_subtitles && matching.include_subtitles.unwrap_or(true),
            aggressive_normalization: !common.no_aggressive
                && matching.aggressive_normalization.unwrap_or(true),
        },
        search_until_similarity: traversal
            .search_until_similarity
            .unwrap_or(defaults.search_until_similarity),
        retries: network.retries.unwrap_or(defaults.retries),
        max_auto_visits: max_visits
            .or(traversal.max_auto_visits)
            .unwrap_or(defaults.max_auto_visits),
        visit_delay: delay_ms
            .map(Duration::from_millis)
            .or(traversal.visit_delay_ms.map(Duration::from_millis))
            .unwrap_or(defaults.visit_delay),
    }
}

fn build_session(
    config: &ConfigFile,
    common: &CommonOpts,
    start: AuthorId,
    session_config: SessionConfig,
) -> Session {
    let network = config.network.clone().unwrap_or_default();
    // Base URL: flag > env > config file > default.
    let base_url = common
        .base_url
        .clone()
        .or_else(|| std::env::var("OPENLIBRARY_BASE_URL").ok())
        .or(network.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let timeout = network
        .timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TIMEOUT);

    let fetcher = ResilientFetcher::over_http(timeout);
    let client = OpenLibrary::new(fetcher, base_url, session_config.retries);

    let color = ColorMode(!common.no_color);
    let quiet = common.json;
    Session::new(client, start, session_config).with_events(move |event| {
        if quiet {
            return;
        }
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = output::print_event(&mut handle, &event, color);
    })
}

fn wire_ctrl_c(session: &Session) {
    let shutdown = session.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });
}

fn report(outcome: Option<&Visit>, common: &CommonOpts) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let Some(visit) = outcome else {
        writeln!(handle, "cancelled before any visit completed")?;
        return Ok(());
    };

    if common.json {
        serde_json::to_writer_pretty(&mut handle, &output::visit_json(visit))?;
        writeln!(handle)?;
    } else {
        output::print_visit(&mut handle, visit, ColorMode(!common.no_color))?;
    }
    Ok(())
}
