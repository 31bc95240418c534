//! UI state model
//!
//! The shell has three primary containers (config form, loading, error) of
//! which exactly one is visible, plus a status banner that can appear on top
//! of any of them. The host renders [`UiState`] snapshots; it never decides
//! visibility itself.

use serde::Serialize;

/// The primary container on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Config,
    Loading,
    Error,
}

/// Contents of the error container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDisplay {
    pub title: String,
    pub message: String,
    pub details: String,
}

/// Values of the config form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub address: String,
    pub token: String,
}

/// Snapshot handed to the host on every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub screen: Screen,
    pub form: FormState,
    pub loading_text: String,
    pub error: Option<ErrorDisplay>,
    pub status_banner: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Config,
            form: FormState::default(),
            loading_text: String::new(),
            error: None,
            status_banner: None,
        }
    }
}

impl UiState {
    /// Show the config form and clear the banner
    pub fn show_config(&mut self) {
        self.screen = Screen::Config;
        self.error = None;
        self.status_banner = None;
    }

    pub fn show_loading(&mut self, text: impl Into<String>) {
        self.screen = Screen::Loading;
        self.error = None;
        self.loading_text = text.into();
    }

    pub fn set_loading_text(&mut self, text: impl Into<String>) {
        self.loading_text = text.into();
    }

    /// Show the error container. The error is mirrored onto the banner.
    pub fn show_error(&mut self, title: &str, message: &str) {
        self.screen = Screen::Error;
        self.error = Some(ErrorDisplay {
            title: title.to_string(),
            message: message.to_string(),
            details: String::new(),
        });
        self.status_banner = Some(format!("{}: {}", title, message));
    }

    pub fn show_banner(&mut self, message: impl Into<String>) {
        self.status_banner = Some(message.into());
    }

    pub fn hide_banner(&mut self) {
        self.status_banner = None;
    }

    pub fn is_visible(&self, screen: Screen) -> bool {
        self.screen == screen
    }
}

/// Host-side presentation surface
pub trait AppShell: Send {
    /// Draw the given state
    fn render(&mut self, ui: &UiState);
    /// Ask the user to confirm leaving the app
    fn confirm_exit(&mut self, prompt: &str) -> bool;
    fn exit_app(&mut self);
}
