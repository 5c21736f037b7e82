//! Shared fixtures: a recording surface and a mock-backed page context.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use insights_core::{
    ApiClient, ExportArtifact, InsightsError, Level, Notification, Region, Surface, UiConfig,
    UserPreferences,
};
use wiremock::MockServer;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Preferences(UserPreferences),
    OverlayShown(String),
    OverlayHidden,
    Toast(Notification),
    Confirm(String),
    Render(Region, String),
    Delivered(ExportArtifact),
}

/// Records everything a controller asks of the display.
pub struct RecordingSurface {
    events: Mutex<Vec<Event>>,
    confirm_answer: bool,
    downloads: PathBuf,
}

impl RecordingSurface {
    pub fn new(confirm_answer: bool, downloads: &Path) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            confirm_answer,
            downloads: downloads.to_path_buf(),
        }
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn toasts(&self) -> Vec<(Level, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Toast(n) => Some((n.level, n.message)),
                _ => None,
            })
            .collect()
    }

    pub fn last_render(&self, region: Region) -> Option<String> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Render(r, content) if r == region => Some(content),
            _ => None,
        })
    }

    pub fn confirmations(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Confirm(_)))
            .count()
    }

    pub fn delivered(&self) -> Vec<ExportArtifact> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delivered(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn last_preferences(&self) -> Option<UserPreferences> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Preferences(p) => Some(p),
            _ => None,
        })
    }

    /// Every overlay shown was hidden again, in order.
    pub fn overlay_settled(&self) -> bool {
        let mut depth = 0i32;
        for event in self.events() {
            match event {
                Event::OverlayShown(_) => depth += 1,
                Event::OverlayHidden => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            }
        }
        depth == 0
    }

    pub fn overlay_shown(&self) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, Event::OverlayShown(_)))
    }
}

impl Surface for RecordingSurface {
    fn apply_preferences(&self, prefs: &UserPreferences) {
        self.record(Event::Preferences(*prefs));
    }

    fn show_overlay(&self, message: &str) {
        self.record(Event::OverlayShown(message.to_string()));
    }

    fn hide_overlay(&self) {
        self.record(Event::OverlayHidden);
    }

    fn notify(&self, notification: Notification) {
        self.record(Event::Toast(notification));
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.record(Event::Confirm(prompt.to_string()));
        self.confirm_answer
    }

    fn render(&self, region: Region, content: &str) {
        self.record(Event::Render(region, content.to_string()));
    }

    fn deliver(&self, artifact: ExportArtifact) -> Result<PathBuf, InsightsError> {
        let path = artifact.write_to(&self.downloads)?;
        self.record(Event::Delivered(artifact));
        Ok(path)
    }
}

pub fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::with_base_url(&server.uri(), Duration::from_secs(5)).unwrap()
}

/// A client pointed at a port nothing listens on.
pub fn unreachable_client() -> ApiClient {
    ApiClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2)).unwrap()
}

pub fn ui() -> UiConfig {
    UiConfig {
        page_size: 2,
        ..UiConfig::default()
    }
}
