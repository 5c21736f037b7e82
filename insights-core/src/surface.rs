//! The seam between page controllers and whatever displays them.
//!
//! Controllers never print. They hand text views, toasts, overlay state,
//! confirmation prompts and export artifacts to a `Surface`. The CLI
//! implements it for a terminal; tests implement it with a recorder.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::InsightsError;
use crate::export::ExportArtifact;
use crate::prefs::UserPreferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Warning,
    Info,
}

/// A transient status banner. `ttl` is how long it stays visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
    pub ttl: Duration,
}

/// Named areas a controller renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Datasets,
    Stats,
    CurrentDataset,
    SampleQuestions,
    RecentConversations,
    Hypotheses,
    TestResults,
    Insights,
    ConversationTitle,
    Conversation,
    FollowUps,
    ConversationList,
    Pagination,
    ConversationDetails,
    SystemSettings,
    InterfaceSettings,
}

pub trait Surface: Send + Sync {
    fn apply_preferences(&self, prefs: &UserPreferences);

    fn show_overlay(&self, message: &str);

    fn hide_overlay(&self);

    fn notify(&self, notification: Notification);

    /// Synchronous yes/no gate. `false` means the action must not run.
    fn confirm(&self, prompt: &str) -> bool;

    /// Replace the contents of `region`.
    fn render(&self, region: Region, content: &str);

    /// Save or open an export; returns where it ended up.
    fn deliver(&self, artifact: ExportArtifact) -> Result<PathBuf, InsightsError>;
}

/// Blocking overlay that is hidden when dropped, on every exit path.
#[must_use = "the overlay is hidden as soon as the guard is dropped"]
pub struct Overlay<'a> {
    surface: &'a dyn Surface,
}

impl<'a> Overlay<'a> {
    pub fn show(surface: &'a dyn Surface, message: &str) -> Self {
        surface.show_overlay(message);
        Self { surface }
    }
}

impl Drop for Overlay<'_> {
    fn drop(&mut self) {
        self.surface.hide_overlay();
    }
}
