//! thread-order - Entry Point

use clap::{Parser, Subcommand};
use futures::executor::LocalPool;
use futures::stream;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;
use thread_order::config::{self, ResolvedConfig};
use thread_order::discovery::{Discovery, PassReport};
use thread_order::host::{MemoryPage, PageSnapshot, ThreadHandle};
use thread_order::logging::{self, LogTarget};
use thread_order::model::{AppError, OrderPreference};
use thread_order::store::{self, file::FileStore};
use thread_order::sync::Reaction;
use tracing::info;

/// Keep thread entries ordered by one shared preference
#[derive(Parser, Debug)]
#[command(name = "thread-order")]
#[command(version)]
#[command(about = "Order thread entries oldest-first or newest-first, shared across views")]
pub struct Args {
    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON file backing the preference store
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Key the preference is stored under
    #[arg(long)]
    pub key: Option<String>,

    /// Log file path, or `-` for stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Bind every thread of a page snapshot and print the resulting order
    Show {
        /// Page snapshot (JSON)
        snapshot: PathBuf,
    },
    /// Print the stored preference
    Get,
    /// Store a preference: `default` or `reversed`
    Set {
        /// New preference
        preference: OrderPreference,
    },
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = config::load_config_with_precedence(args.config.clone())?;
        let merged = config::merge_config(config_file);
        let with_env = config::apply_env_overrides(merged);
        config::apply_cli_overrides(with_env, args.key.clone(), args.store.clone(), args.log_file.clone())
            .validate()?
    };

    logging::init(&LogTarget::from_path(config.log_file_path.clone()))?;

    info!(config = ?config, "Configuration loaded and resolved");

    let mut out = io::stdout().lock();
    run(args.command, &config, &mut out)
}

fn run(command: Command, config: &ResolvedConfig, out: &mut impl Write) -> Result<(), AppError> {
    let store = FileStore::open(&config.store_path)?;
    let mut pool = LocalPool::new();
    match command {
        Command::Get => {
            let preference = pool.run_until(store::read_preference(&store, &config.preference_key))?;
            writeln!(out, "{preference}")?;
        }
        Command::Set { preference } => {
            pool.run_until(store::write_preference(&store, &config.preference_key, preference))?;
            info!(preference = %preference, path = %store.path().display(), "Stored order preference");
            writeln!(out, "{preference}")?;
        }
        Command::Show { snapshot } => {
            let page = PageSnapshot::load(&snapshot)?.into_page()?;
            let mut discovery = Discovery::new(
                page.clone(),
                Rc::new(store),
                config.preference_key.clone(),
                pool.spawner(),
            );
            // A snapshot never navigates: one pass, then the channel closes.
            let report = pool.run_until(discovery.run(stream::empty()));
            pool.run_until_stalled();
            for line in describe(&page, &report) {
                writeln!(out, "{line}")?;
            }
        }
    }
    Ok(())
}

/// One line per thread: ids in their current order, toggle state, and
/// why a thread was left alone.
fn describe(page: &MemoryPage, report: &PassReport) -> Vec<String> {
    let mut lines = Vec::new();
    for thread in page.all_threads() {
        let view = thread.view_id();
        let ids = thread
            .entries()
            .map(|entries| {
                entries
                    .raw_ids()
                    .into_iter()
                    .map(|id| id.unwrap_or_else(|| "?".to_string()))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let status = if let Some((_, error)) = report.unbound.iter().find(|(v, _)| *v == view) {
            format!("unbound: {error}")
        } else if let Some((_, reaction)) = report.bound.iter().find(|(v, _)| *v == view) {
            match reaction {
                Reaction::Skipped { malformed, .. } => format!("skipped: {malformed}"),
                _ => thread
                    .controls()
                    .and_then(|control| control.rendered())
                    .map(|toggle| toggle.to_string())
                    .unwrap_or_default(),
            }
        } else {
            "hidden".to_string()
        };
        lines.push(format!("{view}: [{ids}] {status}"));
    }
    lines
}
