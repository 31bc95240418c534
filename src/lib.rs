//! ha-shell - connection shell for Home Assistant
//!
//! Takes a server address and access token from the user, checks the server
//! answers, then hands off to an embedded browser view pointed at it. The host
//! platform supplies the view, storage and presentation through traits:
//!
//! - [`view::ViewHost`] / [`view::BrowserView`]: the in-app browser
//! - [`store::KeyValueStore`]: persisted address and token
//! - [`ui::AppShell`]: renders [`ui::UiState`] and handles exit prompts
//! - [`probe::Prober`]: reachability check ([`probe::HttpProber`] by default)
//!
//! The [`orchestrator::Orchestrator`] ties them together on one event loop.

pub mod address;
pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod probe;
pub mod retry;
pub mod store;
pub mod ui;
pub mod view;

pub use config::AppConfig;
pub use error::{ConnectError, OpenError, ProbeError, SetupError};
pub use orchestrator::{
    AttemptId, ConnectionState, Event, NetworkStatus, Orchestrator, OrchestratorHandle,
};
pub use ui::{Screen, UiState};
