//! Connection orchestrator
//!
//! Owns one connection attempt at a time, from form submission through the
//! reachability probe to the embedded view, and keeps the [`UiState`] in step.
//!
//! Everything runs on a single task draining an [`Event`] channel. Timers and
//! the probe run as spawned tasks that post tagged events back; every deferred
//! event carries the [`AttemptId`] (or view id) it was created for and is
//! dropped when that id is no longer current, so callbacks from a superseded
//! attempt can never mutate state.
//!
//! ```text
//! Idle --submit--> Probing --probe done (ok or not)--> Opening --loadstop--> Connected
//!                     |                                   |
//!                  timeout                       open failed / loaderror
//!                     v                                   v
//!                  Failed --retry due (count < max)--> Probing
//! any state with a view --exit--> Idle
//! ```

use crate::address;
use crate::config::AppConfig;
use crate::error::{ConnectError, ProbeError};
use crate::probe::Prober;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::store::{self, KeyValueStore};
use crate::ui::{AppShell, Screen, UiState};
use crate::view::{
    BrowserView, ViewEvent, ViewEventSink, ViewHost, HISTORY_BACK_SCRIPT, VIEW_TARGET,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EXIT_PROMPT: &str = "Exit Home Assistant?";
const AUTH_PAGE_MARKER: &str = "/auth/authorize";

/// Monotonic identifier of a connection attempt. A view is identified by the
/// attempt that opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn next(self) -> Self {
        AttemptId(self.0 + 1)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Connectivity change reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

/// Where the current attempt stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Probing,
    Opening,
    Connected,
    /// Error screen shown; `retry_scheduled` is false once retries are used up
    Failed {
        error: ConnectError,
        retry_scheduled: bool,
    },
}

/// Everything the orchestrator reacts to
#[derive(Debug, Clone)]
pub enum Event {
    /// Pre-fill the form from storage, auto-connect if configured
    Start,
    Submit { address: String, token: String },
    QuickAddress(String),
    /// Manual retry from the error screen
    Retry,
    /// Leave the error screen for the config form
    Cancel,
    BackButton,
    Network(NetworkStatus),
    ProbeFinished {
        attempt: AttemptId,
        result: Result<(), ProbeError>,
    },
    AttemptTimedOut { attempt: AttemptId },
    RetryDue { attempt: AttemptId },
    View { view: AttemptId, event: ViewEvent },
    ScriptResult {
        view: AttemptId,
        values: Vec<serde_json::Value>,
    },
    HideBanner { generation: u64 },
    Shutdown,
}

/// Cloneable sender used by the host to feed UI events in
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl OrchestratorHandle {
    /// Queue an event. Returns false once the orchestrator has stopped.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn submit(&self, address: impl Into<String>, token: impl Into<String>) -> bool {
        self.send(Event::Submit {
            address: address.into(),
            token: token.into(),
        })
    }

    pub fn quick_address(&self, address: impl Into<String>) -> bool {
        self.send(Event::QuickAddress(address.into()))
    }

    pub fn retry(&self) -> bool {
        self.send(Event::Retry)
    }

    pub fn cancel(&self) -> bool {
        self.send(Event::Cancel)
    }

    pub fn back_button(&self) -> bool {
        self.send(Event::BackButton)
    }

    pub fn network(&self, status: NetworkStatus) -> bool {
        self.send(Event::Network(status))
    }

    pub fn shutdown(&self) -> bool {
        self.send(Event::Shutdown)
    }
}

/// Server the current episode connects to
#[derive(Debug, Clone)]
struct Target {
    url: String,
    token: Option<String>,
}

struct OpenView {
    id: AttemptId,
    handle: Box<dyn BrowserView>,
    sink: ViewEventSink,
}

pub struct Orchestrator {
    config: AppConfig,
    store: Box<dyn KeyValueStore>,
    prober: Arc<dyn Prober>,
    views: Box<dyn ViewHost>,
    shell: Box<dyn AppShell>,
    tx: mpsc::UnboundedSender<Event>,

    state: ConnectionState,
    attempt: AttemptId,
    retry: RetryPolicy,
    target: Option<Target>,
    view: Option<OpenView>,
    ui: UiState,

    attempt_timer: Option<JoinHandle<()>>,
    probe_task: Option<JoinHandle<()>>,
    retry_timer: Option<JoinHandle<()>>,
    banner_timer: Option<JoinHandle<()>>,
    banner_generation: u64,
}

impl Orchestrator {
    /// Build an orchestrator and the receiving end of its event channel.
    pub fn new(
        config: AppConfig,
        store: Box<dyn KeyValueStore>,
        prober: Arc<dyn Prober>,
        views: Box<dyn ViewHost>,
        shell: Box<dyn AppShell>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let retry = RetryPolicy::new(config.max_retries, config.retry_delay());
        let orchestrator = Self {
            config,
            store,
            prober,
            views,
            shell,
            tx,
            state: ConnectionState::Idle,
            attempt: AttemptId::default(),
            retry,
            target: None,
            view: None,
            ui: UiState::default(),
            attempt_timer: None,
            probe_task: None,
            retry_timer: None,
            banner_timer: None,
            banner_generation: 0,
        };
        (orchestrator, rx)
    }

    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn retry_count(&self) -> u32 {
        self.retry.count()
    }

    pub fn current_attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn has_view(&self) -> bool {
        self.view.is_some()
    }

    /// Run the event loop until [`Event::Shutdown`].
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Event>) {
        self.handle_event(Event::Start);
        while let Some(event) = rx.recv().await {
            if matches!(event, Event::Shutdown) {
                break;
            }
            self.handle_event(event);
        }
        self.shutdown();
    }

    /// Apply one event. Renders when the UI state changed.
    pub fn handle_event(&mut self, event: Event) {
        let before = self.ui.clone();
        let force_render = matches!(event, Event::Start);

        match event {
            Event::Start => self.start(),
            Event::Submit { address, token } => self.submit(&address, &token),
            Event::QuickAddress(address) => self.ui.form.address = address,
            Event::Retry => self.manual_retry(),
            Event::Cancel => {
                self.close_view();
                self.show_config();
            }
            Event::BackButton => self.back_button(),
            Event::Network(status) => self.network_changed(status),
            Event::ProbeFinished { attempt, result } => self.probe_finished(attempt, result),
            Event::AttemptTimedOut { attempt } => self.attempt_timed_out(attempt),
            Event::RetryDue { attempt } => self.retry_due(attempt),
            Event::View { view, event } => self.view_event(view, event),
            Event::ScriptResult { view, values } => self.script_result(view, values),
            Event::HideBanner { generation } => {
                if generation == self.banner_generation {
                    self.ui.hide_banner();
                }
            }
            Event::Shutdown => self.shutdown(),
        }

        if force_render || self.ui != before {
            self.shell.render(&self.ui);
        }
    }

    fn start(&mut self) {
        let saved = store::load_credentials(self.store.as_ref());
        self.ui.form.address = saved
            .server_address
            .clone()
            .unwrap_or_else(|| self.config.default_url.clone());
        self.ui.form.token = saved.access_token.clone().unwrap_or_default();
        self.show_config();

        if self.config.auto_connect {
            if let Some(address) = saved.server_address {
                tracing::info!("Auto-connecting to saved server");
                let token = saved.access_token.unwrap_or_default();
                self.submit(&address, &token);
            }
        }
    }

    fn submit(&mut self, address: &str, token: &str) {
        if self.view.is_some() {
            tracing::warn!("Ignoring submit while a view is open");
            return;
        }

        let address = address.trim();
        let token = token.trim();
        self.retry.reset();

        if address.is_empty() {
            self.fail(ConnectError::Validation);
            return;
        }

        let url = address::normalize(address);
        self.ui.form.address = url.clone();
        self.ui.form.token = token.to_string();
        if let Err(e) = store::save_credentials(self.store.as_mut(), &url, token) {
            tracing::warn!("Failed to save server settings: {}", e);
        }

        self.target = Some(Target {
            url,
            token: (!token.is_empty()).then(|| token.to_string()),
        });
        self.begin_attempt();
    }

    /// Start (or restart) an attempt against the current target.
    fn begin_attempt(&mut self) {
        let Some(target) = self.target.clone() else {
            self.show_config();
            return;
        };

        self.cancel_attempt_timers();
        self.close_view();
        self.attempt = self.attempt.next();
        let attempt = self.attempt;
        tracing::info!(
            "Attempt {} connecting to {}",
            attempt,
            address::display_url(&target.url)
        );

        self.state = ConnectionState::Probing;
        self.ui.show_loading("Verifying connection...");
        self.attempt_timer = Some(self.schedule(
            self.config.connection_timeout(),
            Event::AttemptTimedOut { attempt },
        ));

        self.ui.set_loading_text(format!(
            "Connecting to: {}",
            address::display_url(&target.url)
        ));

        let prober = Arc::clone(&self.prober);
        let probe_timeout = self.config.probe_timeout();
        let tx = self.tx.clone();
        self.probe_task = Some(tokio::spawn(async move {
            let probe = prober.probe(&target.url, target.token.as_deref());
            let result = match tokio::time::timeout(probe_timeout, probe).await {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout),
            };
            let _ = tx.send(Event::ProbeFinished { attempt, result });
        }));
    }

    fn probe_finished(&mut self, attempt: AttemptId, result: Result<(), ProbeError>) {
        if attempt != self.attempt || self.state != ConnectionState::Probing {
            tracing::debug!("Ignoring probe result of stale attempt {}", attempt);
            return;
        }

        if let Some(timer) = self.attempt_timer.take() {
            timer.abort();
        }
        self.probe_task = None;

        match result {
            Ok(()) => tracing::info!("Probe succeeded"),
            Err(e) => tracing::warn!("Probe failed, opening anyway: {}", e),
        }
        self.open_view();
    }

    fn open_view(&mut self) {
        let Some(target) = self.target.clone() else {
            self.show_config();
            return;
        };

        self.state = ConnectionState::Opening;
        self.ui.set_loading_text("Starting Home Assistant...");

        let url = address::launch_url(&target.url, target.token.as_deref());
        let options = self.config.browser.to_options_string();
        let sink = ViewEventSink::new(self.attempt, self.tx.clone());

        match self.views.open(&url, VIEW_TARGET, &options, sink.clone()) {
            Ok(handle) => {
                tracing::info!("Opened embedded view for attempt {}", self.attempt);
                self.view = Some(OpenView {
                    id: self.attempt,
                    handle,
                    sink,
                });
            }
            Err(e) => {
                tracing::error!("Failed to open embedded view: {}", e);
                self.fail(ConnectError::Open(e.0));
            }
        }
    }

    fn attempt_timed_out(&mut self, attempt: AttemptId) {
        if attempt != self.attempt || self.state != ConnectionState::Probing {
            tracing::debug!("Ignoring timeout of stale attempt {}", attempt);
            return;
        }
        tracing::warn!("Attempt {} timed out", attempt);
        self.attempt_timer = None;
        self.fail(ConnectError::Timeout);
    }

    fn view_event(&mut self, view: AttemptId, event: ViewEvent) {
        if self.view.as_ref().map(|v| v.id) != Some(view) {
            tracing::debug!("Ignoring {:?} from closed view {}", event, view);
            return;
        }

        match event {
            ViewEvent::LoadStart { url } => {
                tracing::debug!("View loading {}", url);
                if url.contains(AUTH_PAGE_MARKER) {
                    tracing::info!(
                        "Auth page reached, token provided: {}",
                        self.target.as_ref().is_some_and(|t| t.token.is_some())
                    );
                }
                self.ui.set_loading_text("Loading interface...");
            }
            ViewEvent::LoadStop { url } => {
                tracing::debug!("View loaded {}", url);
                if self.state == ConnectionState::Opening {
                    tracing::info!("Connected to Home Assistant");
                    self.state = ConnectionState::Connected;
                    self.ui.set_loading_text("Connected");
                    let duration = self.config.status_banner_duration();
                    self.set_banner("Connected to Home Assistant", Some(duration));
                }
            }
            ViewEvent::LoadError { message } => {
                if matches!(
                    self.state,
                    ConnectionState::Opening | ConnectionState::Connected
                ) {
                    tracing::error!("View failed to load: {}", message);
                    self.fail(ConnectError::Load(message));
                }
            }
            ViewEvent::Exit => {
                tracing::info!("Embedded view closed");
                self.view = None;
                self.show_config();
            }
        }
    }

    fn script_result(&mut self, view: AttemptId, values: Vec<serde_json::Value>) {
        let Some(open) = self.view.as_mut().filter(|v| v.id == view) else {
            return;
        };
        if values.first() == Some(&serde_json::Value::Bool(false)) {
            // Nothing to go back to; the exit callback returns us to the form
            open.handle.close();
        }
    }

    fn back_button(&mut self) {
        if let Some(open) = self.view.as_mut() {
            let reply = open.sink.script_reply();
            open.handle.execute_script(HISTORY_BACK_SCRIPT, reply);
        } else if !self.ui.is_visible(Screen::Config) {
            self.show_config();
        } else if self.shell.confirm_exit(EXIT_PROMPT) {
            self.shell.exit_app();
        }
    }

    fn manual_retry(&mut self) {
        if !matches!(self.state, ConnectionState::Failed { .. }) {
            return;
        }
        self.retry.reset();
        if self.target.is_some() {
            self.begin_attempt();
        } else {
            self.show_config();
        }
    }

    fn retry_due(&mut self, attempt: AttemptId) {
        let scheduled = matches!(
            self.state,
            ConnectionState::Failed {
                retry_scheduled: true,
                ..
            }
        );
        if attempt != self.attempt || !scheduled {
            tracing::debug!("Ignoring retry of stale attempt {}", attempt);
            return;
        }
        self.retry_timer = None;
        tracing::info!(
            "Retrying ({}/{})",
            self.retry.count(),
            self.retry.max_retries()
        );
        self.begin_attempt();
    }

    fn network_changed(&mut self, status: NetworkStatus) {
        match status {
            NetworkStatus::Online => {
                tracing::info!("Network connection restored");
                let duration = self.config.status_banner_duration();
                self.set_banner("Network connection restored", Some(duration));
            }
            NetworkStatus::Offline => {
                tracing::warn!("Network connection lost");
                self.set_banner("Network connection lost", None);
            }
        }
    }

    /// Route a failure to the error screen and apply the retry policy.
    fn fail(&mut self, error: ConnectError) {
        self.cancel_attempt_timers();

        let (message, retry_scheduled) = if !error.is_retryable() {
            (error.message(), false)
        } else {
            match self.retry.on_failure() {
                RetryDecision::Retry { retry, max, delay } => {
                    let attempt = self.attempt;
                    self.retry_timer = Some(self.schedule(delay, Event::RetryDue { attempt }));
                    (format!("{} (retry {}/{})", error.message(), retry, max), true)
                }
                RetryDecision::Exhausted { .. } => (
                    format!("{} - maximum retries exceeded", error.message()),
                    false,
                ),
            }
        };

        self.ui.show_error(error.title(), &message);
        self.invalidate_banner_timer();
        self.state = ConnectionState::Failed {
            error,
            retry_scheduled,
        };
    }

    /// Back to the form: ends the episode and invalidates its pending callbacks.
    fn show_config(&mut self) {
        self.cancel_attempt_timers();
        self.attempt = self.attempt.next();
        self.retry.reset();
        self.invalidate_banner_timer();
        self.ui.show_config();
        self.state = ConnectionState::Idle;
    }

    fn set_banner(&mut self, message: &str, auto_hide: Option<Duration>) {
        self.invalidate_banner_timer();
        self.ui.show_banner(message);
        if let Some(delay) = auto_hide {
            let generation = self.banner_generation;
            self.banner_timer = Some(self.schedule(delay, Event::HideBanner { generation }));
        }
    }

    fn invalidate_banner_timer(&mut self) {
        self.banner_generation += 1;
        if let Some(timer) = self.banner_timer.take() {
            timer.abort();
        }
    }

    fn cancel_attempt_timers(&mut self) {
        for task in [
            self.attempt_timer.take(),
            self.probe_task.take(),
            self.retry_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }

    /// Close the current view without returning to the form. Its exit callback
    /// arrives for a view that is no longer current and is dropped.
    fn close_view(&mut self) {
        if let Some(mut open) = self.view.take() {
            tracing::debug!("Closing view {}", open.id);
            open.handle.close();
        }
    }

    fn shutdown(&mut self) {
        self.cancel_attempt_timers();
        self.invalidate_banner_timer();
        self.close_view();
    }

    fn schedule(&self, delay: Duration, event: Event) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(event);
        })
    }
}
