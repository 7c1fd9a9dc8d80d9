//! Specimen Tracker - museum specimen cleaning session tracker.
//!
//! This binary hosts the tracker over a JSON Lines feed of game records.
//!
//! # Commands
//!
//! - `specimen-tracker replay <FILE>`: Replay a recorded feed and print the totals
//! - `specimen-tracker follow <FILE>`: Tail a live feed, ticking on a timer
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use specimen_tracker::clock::SystemClock;
use specimen_tracker::config::Config;
use specimen_tracker::feed::{self, FeedDriver, FeedRecord, ScriptedClient};
use specimen_tracker::notification::{Notification, Notifier};
use specimen_tracker::plugin::SpecimenCleaningPlugin;
use specimen_tracker::session::SessionStats;
use specimen_tracker::watcher::FeedWatcher;

/// Capacity of the channel carrying tailed feed lines.
const FEED_LINE_BUFFER: usize = 256;

/// Specimen Tracker - museum specimen cleaning session tracker.
///
/// Counts uncleaned finds, artefacts and antique lamps obtained while
/// cleaning specimens, resetting the tally after a period of inactivity.
#[derive(Parser, Debug)]
#[command(name = "specimen-tracker")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    SPECIMEN_TIMEOUT_MINUTES     Idle minutes before reset, 0 disables (default: 5)
    SPECIMEN_SHOW_NOTIFICATIONS  Print lamp and reset notifications (default: true)
    SPECIMEN_NEVER_RESET_LAMPS   Keep the lamp counter across resets (default: false)
    SPECIMEN_TICK_INTERVAL_MS    Tick period for 'follow' (default: 600)
    RUST_LOG                     Log filter (default: info)

EXAMPLES:
    # Replay a recorded session
    specimen-tracker replay session.jsonl

    # Follow a live feed with a ten minute timeout
    export SPECIMEN_TIMEOUT_MINUTES=10
    specimen-tracker follow /tmp/host-feed.jsonl
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded feed.
    ///
    /// Every record must carry an `at` timestamp, which drives the clock.
    /// Prints notifications as they happen and the final stats as JSON.
    Replay {
        /// Path to the JSON Lines feed.
        path: PathBuf,
    },

    /// Tail a live feed.
    ///
    /// Records appended to the file are applied as they arrive; ticks are
    /// generated every SPECIMEN_TICK_INTERVAL_MS. Stops on Ctrl+C.
    Follow {
        /// Path to the JSON Lines feed.
        path: PathBuf,
    },
}

/// Prints notifications to stdout as chat lines.
struct ChatPrinter;

impl Notifier for ChatPrinter {
    fn notify(&mut self, notification: Notification) {
        print_notification(notification);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        timeout_minutes = config.timeout_minutes,
        show_notifications = config.show_notifications,
        never_reset_lamps = config.never_reset_lamps,
        "Configuration loaded"
    );

    match cli.command {
        Command::Replay { path } => run_replay(&path, &config),
        Command::Follow { path } => {
            // The plugin is not Send; everything stays on one thread
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_follow(path, config))
        }
    }
}

/// Runs the replay command.
fn run_replay(path: &Path, config: &Config) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read feed {}", path.display()))?;

    let outcome = feed::replay_with(&contents, config.session_config(), ChatPrinter)
        .with_context(|| format!("Failed to replay {}", path.display()))?;

    debug!(
        records = outcome.records,
        notifications = outcome.notifications.len(),
        "Replay complete"
    );

    print_stats(&outcome.stats)
}

/// Runs the follow command until a shutdown signal arrives.
async fn run_follow(path: PathBuf, config: Config) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::channel::<Vec<String>>(FEED_LINE_BUFFER);
    let watcher = FeedWatcher::new(path.clone(), line_tx)
        .with_context(|| format!("Failed to watch feed {}", path.display()))?;

    info!(path = %watcher.path().display(), "Feed watcher initialized");

    let (notification_tx, mut notification_rx) = mpsc::unbounded_channel::<Notification>();

    let mut driver = FeedDriver::new(ScriptedClient::new());
    let mut plugin = SpecimenCleaningPlugin::new(
        driver.client().clone(),
        SystemClock,
        notification_tx,
        config.session_config(),
    );
    plugin.start(driver.bus_mut());

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    // Counts lines since the watcher started, for log messages
    let mut line_number = 0usize;

    info!("Tracker running. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }

            Some(lines) = line_rx.recv() => {
                for line in lines {
                    line_number += 1;
                    match feed::parse_record(line_number, &line) {
                        Ok(Some(record)) => driver.apply(record),
                        Ok(None) => {}
                        Err(e) => warn!(error = %e, "Skipping malformed feed record"),
                    }
                }
            }

            _ = ticker.tick() => {
                driver.apply(FeedRecord::Tick { at: None });
            }

            Some(notification) = notification_rx.recv() => {
                print_notification(notification);
            }
        }
    }

    info!("Shutting down...");

    plugin.stop(driver.bus_mut());

    // Anything emitted by the final events
    while let Ok(notification) = notification_rx.try_recv() {
        print_notification(notification);
    }

    print_stats(&plugin.stats())?;

    info!("Tracker stopped");
    Ok(())
}

fn print_notification(notification: Notification) {
    if notification.is_highlighted() {
        println!("[!] {notification}");
    } else {
        println!("{notification}");
    }
}

fn print_stats(stats: &SessionStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize stats")?;
    println!("{json}");
    Ok(())
}

/// Initializes the tracing subscriber with environment-based filtering.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
