//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookmirror_client::{ApiClient, Session, SessionOptions};
use bookmirror_mirror::{FsStore, Mirror, MirrorReport, ProgressReporter};
use bookmirror_shared::{
    AppConfig, MirrorConfig, init_config, load_config, resolve_session_token,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookmirror — mirror an online exercise book into static HTML.
#[derive(Parser)]
#[command(
    name = "bookmirror",
    version,
    about = "Mirror an online exercise book into a local tree of static HTML pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Mirror a book edition into a local directory tree.
    Mirror {
        /// Remote book edition identifier.
        book_id: u64,

        /// Output root directory (defaults to the configured output_dir).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Maximum concurrently processed sections (defaults to config).
        #[arg(short, long)]
        concurrency: Option<u32>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Mirror {
            book_id,
            out,
            concurrency,
        } => cmd_mirror(book_id, out, concurrency).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// mirror
// ---------------------------------------------------------------------------

async fn cmd_mirror(book_id: u64, out: Option<PathBuf>, concurrency: Option<u32>) -> Result<()> {
    let config = load_config()?;
    let session_token = resolve_session_token(&config)?;

    let mut mirror_config = MirrorConfig::from(&config);
    if let Some(out) = out {
        mirror_config.output_dir = out;
    }
    if let Some(concurrency) = concurrency {
        mirror_config.concurrency = concurrency;
    }

    info!(
        book_id,
        out = %mirror_config.output_dir.display(),
        concurrency = mirror_config.concurrency,
        "mirroring book"
    );

    let session_opts = SessionOptions::new(
        config.api.auth_base_url.as_str(),
        config.api.origin.as_str(),
        config.api.referer.as_str(),
        session_token,
    );
    let session = Session::bootstrap(&session_opts).await?;
    let api = ApiClient::new(session.client().clone(), &config.api.content_base_url);

    let reporter = Arc::new(CliProgress::new());
    let mirror = Mirror::new(api, Arc::new(FsStore), mirror_config.concurrency)
        .with_progress(reporter);

    let report = mirror.run(book_id, &mirror_config.output_dir).await?;

    // Print summary
    println!();
    println!("  Mirror complete!");
    println!("  Book:    {}", report.book_name);
    println!("  Written: {}", report.leaves_written);
    println!("  Skipped: {}", report.leaves_skipped);
    println!("  Failed:  {}", report.failures.len());
    println!("  Time:    {:.1}s", report.duration.as_secs_f64());
    println!();

    if !report.failures.is_empty() {
        println!("  Failed leaves (re-run to retry just these):");
        for (path, reason) in &report.failures {
            println!("    {path}: {reason}");
        }
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn leaf_written(&self, path: &str) {
        self.spinner.set_message(format!("Writing {path}"));
    }

    fn leaf_skipped(&self, path: &str) {
        self.spinner.set_message(format!("Skipping {path}"));
    }

    fn done(&self, _report: &MirrorReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
