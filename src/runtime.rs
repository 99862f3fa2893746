//! Runtime services and the session supervisor for the mention-bot.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{Err, Res, Void},
    },
    directory::MentionDirectory,
    interaction::Agent,
    service::{chat::ChatClient, dialogue::DialogueClient, feed::FeedClient, store::StoreClient},
    session::{self, FeedSession},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the configuration and the service clients. It is designed to be
/// trivially cloneable, allowing it to be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The chat client instance.
    pub chat: ChatClient,
    /// The realtime feed connector.
    pub feed: FeedClient,
    /// The dialogue client, when the fallback responder is enabled.
    pub dialogue: Option<DialogueClient>,
    /// The store holding credentials and mention groups.
    pub store: StoreClient,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Credentials come from the configuration and, when absent there, from the store
    /// document.
    #[instrument(skip_all)]
    pub fn new(config: Config) -> Res<(Self, MentionDirectory)> {
        // Load the store.
        let store = StoreClient::json(&config.store_path);
        let directory = MentionDirectory::load(store.clone())?;

        // Resolve credentials.
        let access_token = pick(&config.yammer_access_token, directory.access_token());
        if access_token.is_empty() {
            return Err(anyhow::anyhow!("No Yammer access token in configuration or {}.", config.store_path.display()));
        }

        let api_key = pick(&config.docomo_api_key, directory.api_key());
        let dialogue = match (config.fallback_enabled, api_key.is_empty()) {
            (true, false) => Some(DialogueClient::docomo(&config, api_key)),
            (true, true) => {
                warn!("No dialogue API key configured; free-form chat is disabled.");
                None
            }
            (false, _) => None,
        };

        // Initialize the clients.
        let chat = ChatClient::yammer(&config, access_token);
        let feed = FeedClient::cometd();

        Ok((Self { config, chat, feed, dialogue, store }, directory))
    }

    /// Build the agent that owns the directory and the dialogue contexts.
    pub fn agent(&self, directory: MentionDirectory) -> Agent {
        Agent::new(&self.config, self.chat.clone(), self.dialogue.clone(), directory)
    }
}

fn pick<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.is_empty() { fallback } else { preferred }
}

// Supervisor.

/// Supervisor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Active,
}

/// How a session ended.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Whether the session reached polling before it ended.
    pub was_active: bool,
    pub error: Option<Err>,
}

/// Decides how long to wait before the next session.
pub trait ReconnectPolicy: Send {
    /// `None` reconnects immediately.
    fn next_delay(&mut self, outcome: &SessionOutcome) -> Option<Duration>;
}

/// Reconnects immediately, forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl ReconnectPolicy for Immediate {
    fn next_delay(&mut self, _outcome: &SessionOutcome) -> Option<Duration> {
        None
    }
}

/// Runs feed sessions back to back until shut down.
///
/// Sessions never overlap: the next one starts only after the previous session and its
/// poll worker have finished.
pub struct Supervisor {
    runtime: Runtime,
    agent: Agent,
    policy: Box<dyn ReconnectPolicy>,
    state: watch::Sender<SupervisorState>,
    sessions: u64,
}

impl Supervisor {
    pub fn new(runtime: Runtime, agent: Agent) -> Self {
        Self::with_policy(runtime, agent, Box::new(Immediate))
    }

    pub fn with_policy(runtime: Runtime, agent: Agent, policy: Box<dyn ReconnectPolicy>) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);

        Self {
            runtime,
            agent,
            policy,
            state,
            sessions: 0,
        }
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Follows state changes, e.g. for health reporting.
    pub fn watch_state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Number of sessions started so far.
    pub fn sessions(&self) -> u64 {
        self.sessions
    }

    fn transition(&self, state: SupervisorState) {
        transition(&self.state, state);
    }

    /// Runs sessions until `shutdown` is set.
    ///
    /// Session failures are logged and followed by a new session; nothing here ends the
    /// loop except the shutdown signal.
    #[instrument(name = "Supervisor::run", skip_all)]
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Void {
        while !*shutdown.borrow_and_update() {
            let outcome = self.run_once(shutdown.clone()).await;

            if let Some(err) = &outcome.error {
                error!("Session ended: {:#}", err);
            }

            if let Some(delay) = self.policy.next_delay(&outcome) {
                tokio::select! {
                    _ = session::stop_requested(&mut shutdown) => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!("Supervisor stopped after {} sessions.", self.sessions);

        Ok(())
    }

    /// Runs a single session: `Idle -> Connecting -> Active -> Idle`.
    pub async fn run_once(&mut self, stop: watch::Receiver<bool>) -> SessionOutcome {
        self.sessions += 1;
        self.transition(SupervisorState::Connecting);

        let mut session = FeedSession::new(self.runtime.chat.clone(), self.runtime.feed.clone());
        let state = &self.state;
        let result = session.run(&mut self.agent, stop, || transition(state, SupervisorState::Active)).await;

        self.transition(SupervisorState::Idle);

        SessionOutcome {
            was_active: session.reached_polling(),
            error: result.err(),
        }
    }
}

fn transition(state: &watch::Sender<SupervisorState>, next: SupervisorState) {
    let previous = state.send_replace(next);
    info!("Supervisor {:?} -> {:?}", previous, next);
}
