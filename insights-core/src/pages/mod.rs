//! Page controllers.
//!
//! Each controller mirrors one screen of the web front end and follows the
//! same shape: fetch, render into a region, and attach actions that call one
//! endpoint, toast the outcome and refresh whatever depends on it. Mutating
//! actions hold an [`Overlay`] for the duration of the request; destructive
//! ones ask [`Surface::confirm`] before any request is issued.

pub mod chat;
pub mod conversations;
pub mod datasets;
pub mod hypotheses;
pub mod settings;

pub use chat::ChatPage;
pub use conversations::ConversationsPage;
pub use datasets::{DatasetsPage, UploadRequest};
pub use hypotheses::HypothesisPage;
pub use settings::SettingsPage;

use std::time::Duration;

use crate::api::ApiClient;
use crate::config::UiConfig;
use crate::surface::{Level, Notification, Overlay, Surface};

/// What every controller needs: the backend, the display, and UI knobs.
#[derive(Clone, Copy)]
pub struct PageContext<'a> {
    pub api: &'a ApiClient,
    pub surface: &'a dyn Surface,
    pub ui: &'a UiConfig,
}

impl<'a> PageContext<'a> {
    pub fn new(api: &'a ApiClient, surface: &'a dyn Surface, ui: &'a UiConfig) -> Self {
        Self { api, surface, ui }
    }

    pub fn overlay(&self, message: &str) -> Overlay<'a> {
        Overlay::show(self.surface, message)
    }

    pub fn toast(&self, level: Level, message: impl Into<String>) {
        self.toast_for(level, message, self.ui.toast_ttl());
    }

    pub fn toast_for(&self, level: Level, message: impl Into<String>, ttl: Duration) {
        self.surface.notify(Notification {
            level,
            message: message.into(),
            ttl,
        });
    }
}
