//! Embedded browser view capability
//!
//! The host platform owns the actual in-app browser. The orchestrator only
//! sees it through [`ViewHost`] / [`BrowserView`] and receives its lifecycle
//! callbacks through a [`ViewEventSink`] tagged with the attempt that opened it.

use crate::error::OpenError;
use crate::orchestrator::{AttemptId, Event};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Window target passed to the view host
pub const VIEW_TARGET: &str = "_blank";

/// Script run on hardware back: navigates back in page history when possible
/// and reports whether it did.
pub const HISTORY_BACK_SCRIPT: &str =
    "if (window.history.length > 1) { window.history.back(); true; } else { false; }";

/// Lifecycle callbacks emitted by an open view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    LoadStart { url: String },
    LoadStop { url: String },
    LoadError { message: String },
    Exit,
}

/// Handle given to the host when a view is opened. Forwards callbacks into
/// the orchestrator's event loop.
#[derive(Debug, Clone)]
pub struct ViewEventSink {
    view: AttemptId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ViewEventSink {
    pub(crate) fn new(view: AttemptId, tx: mpsc::UnboundedSender<Event>) -> Self {
        Self { view, tx }
    }

    /// Deliver a view callback. Returns false once the orchestrator is gone.
    pub fn emit(&self, event: ViewEvent) -> bool {
        self.tx
            .send(Event::View {
                view: self.view,
                event,
            })
            .is_ok()
    }

    /// Reply channel for a script execution on this view
    pub fn script_reply(&self) -> ScriptReply {
        ScriptReply {
            view: self.view,
            tx: self.tx.clone(),
        }
    }

    pub fn view_id(&self) -> AttemptId {
        self.view
    }
}

/// One-shot reply for [`BrowserView::execute_script`]
#[derive(Debug)]
pub struct ScriptReply {
    view: AttemptId,
    tx: mpsc::UnboundedSender<Event>,
}

impl ScriptReply {
    /// Report the script's result values (one per frame, as the webview returns them).
    pub fn send(self, values: Vec<serde_json::Value>) {
        if self
            .tx
            .send(Event::ScriptResult {
                view: self.view,
                values,
            })
            .is_err()
        {
            tracing::debug!("Script result dropped, orchestrator stopped");
        }
    }
}

/// Factory for embedded views
pub trait ViewHost: Send {
    /// Open `url` in a new embedded view. Lifecycle callbacks go to `events`.
    fn open(
        &mut self,
        url: &str,
        target: &str,
        options: &str,
        events: ViewEventSink,
    ) -> Result<Box<dyn BrowserView>, OpenError>;
}

/// A live embedded view
pub trait BrowserView: Send {
    fn execute_script(&mut self, code: &str, reply: ScriptReply);
    /// Close the view. The host still emits [`ViewEvent::Exit`] afterwards.
    fn close(&mut self);
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Fixed flags for the embedded view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BrowserOptions {
    pub location: bool,
    pub toolbar: bool,
    pub zoom: bool,
    pub hardware_back: bool,
    pub clear_cache: bool,
    pub clear_session_cache: bool,
    pub close_button_caption: String,
    pub disallow_overscroll: bool,
    pub hide_navigation_buttons: bool,
    pub hide_url_bar: bool,
    pub fullscreen: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            location: true,
            toolbar: true,
            zoom: true,
            hardware_back: true,
            clear_cache: false,
            clear_session_cache: false,
            close_button_caption: "Close".to_string(),
            disallow_overscroll: true,
            hide_navigation_buttons: false,
            hide_url_bar: false,
            fullscreen: false,
        }
    }
}

impl BrowserOptions {
    /// Render as the comma-joined `key=value` list the view host expects
    pub fn to_options_string(&self) -> String {
        [
            ("location", yes_no(self.location).to_string()),
            ("toolbar", yes_no(self.toolbar).to_string()),
            ("zoom", yes_no(self.zoom).to_string()),
            ("hardwareback", yes_no(self.hardware_back).to_string()),
            ("clearcache", yes_no(self.clear_cache).to_string()),
            ("clearsessioncache", yes_no(self.clear_session_cache).to_string()),
            ("closebuttoncaption", self.close_button_caption.clone()),
            ("disallowoverscroll", yes_no(self.disallow_overscroll).to_string()),
            ("hidenavigationbuttons", yes_no(self.hide_navigation_buttons).to_string()),
            ("hideurlbar", yes_no(self.hide_url_bar).to_string()),
            ("fullscreen", yes_no(self.fullscreen).to_string()),
        ]
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(",")
    }
}
