//! Library root for `mention-bot`.
//!
//! Mention-bot is a Yammer assistant that manages "mention groups":
//! - Keeps named groups of users (`%eng`, `%ops`, ...) in a persisted directory
//! - Adds, removes, renames, deletes and lists groups on request
//! - CCs a whole group into a thread with a single command
//! - Chats freely through a dialogue service when no command matches
//!
//! The bot listens on the Yammer realtime feed, reconnecting whenever the feed drops.
//! Each external service sits behind a trait so it can be swapped or mocked.

pub mod base;
pub mod directory;
pub mod interaction;
pub mod runtime;
pub mod service;
pub mod session;

use base::{config::Config, types::Void};
use tokio::sync::watch;
use tracing::{info, warn};

/// Public async entry for the binary crate.
///
/// Sets up the services and runs the supervisor:
/// - Loads the mention group directory and resolves credentials
/// - Creates the chat, feed and dialogue clients
/// - Runs feed sessions until Ctrl-C
pub async fn start(config: Config) -> Void {
    info!("Starting mention-bot ...");

    // Initialize the runtime.
    let (runtime, directory) = runtime::Runtime::new(config)?;
    let agent = runtime.agent(directory);

    // Wire up the shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down ...");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                // Keep the sender alive so sessions are not told to stop.
                warn!("Unable to listen for Ctrl-C: {}", err);
                std::future::pending::<()>().await;
            }
        }
    });

    // Start the supervisor.
    let mut supervisor = runtime::Supervisor::new(runtime, agent);
    supervisor.run(shutdown_rx).await
}
