//! The question/answer page.
//!
//! Holds the visible transcript, the input line and the id of the conversation
//! the backend appends to. A successful question appends exactly one question
//! block and one answer block, in that order.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use super::PageContext;
use crate::error::{ApiError, ErrorKind, InsightsError, NETWORK_ERROR_MESSAGE};
use crate::export::ConversationFormat;
use crate::models::{ConversationListing, Message, Role, Stats};
use crate::prefs::{PreferenceStore, UserPreferences};
use crate::render::{self, Block};
use crate::surface::{Level, Region};

pub const CLEAR_PROMPT: &str = "Are you sure you want to clear this conversation? This will only clear the display, not delete the conversation history.";

const ASK_FALLBACK: &str = "An error occurred while processing your question.";

/// Title used when a new conversation is created without one.
pub fn default_conversation_title() -> String {
    format!("Conversation {}", Local::now().format("%Y-%m-%d %H:%M:%S"))
}

pub struct ChatPage<'a> {
    ctx: PageContext<'a>,
    prefs: UserPreferences,
    input: String,
    conversation_id: Option<String>,
    title: String,
    blocks: Vec<Block>,
    follow_ups: Vec<String>,
    samples: Vec<String>,
}

impl<'a> ChatPage<'a> {
    pub fn new(ctx: PageContext<'a>, prefs: UserPreferences) -> Self {
        Self {
            ctx,
            prefs,
            input: String::new(),
            conversation_id: None,
            title: String::new(),
            blocks: Vec::new(),
            follow_ups: Vec::new(),
            samples: Vec::new(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn set_conversation_id(&mut self, id: impl Into<String>) {
        self.conversation_id = Some(id.into());
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn follow_ups(&self) -> &[String] {
        &self.follow_ups
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// The chat page expires toasts a second sooner than the other pages.
    fn toast(&self, level: Level, message: impl Into<String>) {
        let ttl = self.ctx.ui.toast_ttl().saturating_sub(Duration::from_secs(1));
        self.ctx.toast_for(level, message, ttl);
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
        self.render_transcript();
    }

    fn render_transcript(&self) {
        self.ctx
            .surface
            .render(Region::Conversation, &render::transcript(&self.blocks));
    }

    fn set_title(&mut self, title: String) {
        self.ctx.surface.render(Region::ConversationTitle, &title);
        self.title = title;
    }

    fn clear_display(&mut self) {
        self.blocks.clear();
        self.follow_ups.clear();
        self.render_transcript();
        self.ctx.surface.render(Region::FollowUps, "");
    }

    // ------------------------------------------------------------------------
    // Page load
    // ------------------------------------------------------------------------

    /// Apply preferences, then load stats, samples and recents concurrently.
    pub async fn open(&mut self) {
        self.ctx.surface.apply_preferences(&self.prefs);
        self.render_transcript();

        let api = self.ctx.api;
        let (stats, samples, recent) = futures::join!(
            api.stats(),
            api.sample_questions(),
            api.list_conversations()
        );

        self.show_stats(stats);
        self.show_samples(samples);
        self.show_recent(recent).await;
    }

    fn show_stats(&self, stats: Result<Stats, ApiError>) {
        match stats {
            Ok(stats) => {
                self.ctx
                    .surface
                    .render(Region::CurrentDataset, &render::current_dataset(&stats));
                self.ctx.surface.render(Region::Stats, &render::stats(&stats));
            }
            Err(e) => {
                let banner = match e.kind() {
                    ErrorKind::Api => "Failed to load statistics",
                    ErrorKind::Network => "Network error",
                };
                self.ctx.surface.render(Region::Stats, banner);
            }
        }
    }

    fn show_samples(&mut self, samples: Result<Vec<String>, ApiError>) {
        match samples {
            Ok(mut questions) => {
                questions.truncate(self.ctx.ui.sample_questions);
                self.ctx
                    .surface
                    .render(Region::SampleQuestions, &render::numbered(&questions));
                self.samples = questions;
            }
            Err(e) => {
                let banner = match e.kind() {
                    ErrorKind::Api => "Failed to load sample questions",
                    ErrorKind::Network => "Network error",
                };
                self.ctx.surface.render(Region::SampleQuestions, banner);
            }
        }
    }

    async fn show_recent(&mut self, listing: Result<ConversationListing, ApiError>) {
        match listing {
            Ok(listing) => {
                let shown = listing.conversations.len().min(self.ctx.ui.recent_conversations);
                self.ctx.surface.render(
                    Region::RecentConversations,
                    &render::recent_conversations(
                        &listing.conversations[..shown],
                        listing.current_conversation_id.as_deref(),
                    ),
                );

                if self.conversation_id.is_none() {
                    if let Some(current) = listing.current_conversation_id {
                        self.conversation_id = Some(current);
                        self.refresh_title().await;
                    }
                }
            }
            Err(e) => {
                let banner = match e.kind() {
                    ErrorKind::Api => "Failed to load conversations",
                    ErrorKind::Network => "Network error",
                };
                self.ctx.surface.render(Region::RecentConversations, banner);
            }
        }
    }

    async fn refresh_recent(&mut self) {
        let listing = self.ctx.api.list_conversations().await;
        self.show_recent(listing).await;
    }

    async fn refresh_title(&mut self) {
        let Some(id) = self.conversation_id.clone() else {
            return;
        };
        match self.ctx.api.conversation(&id).await {
            Ok(conversation) => self.set_title(conversation.title),
            Err(e) => tracing::debug!(error = %e, "could not refresh conversation title"),
        }
    }

    // ------------------------------------------------------------------------
    // Input helpers
    // ------------------------------------------------------------------------

    /// Copy sample question `index` into the input line.
    pub fn use_sample(&mut self, index: usize) -> bool {
        match self.samples.get(index) {
            Some(question) => {
                self.input = question.clone();
                true
            }
            None => false,
        }
    }

    /// Copy follow-up suggestion `index` into the input line.
    pub fn use_follow_up(&mut self, index: usize) -> bool {
        match self.follow_ups.get(index) {
            Some(question) => {
                self.input = question.clone();
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Send the input line. Blank input sends nothing and changes nothing.
    pub async fn submit(&mut self) -> bool {
        let question = self.input.trim().to_string();
        if question.is_empty() {
            return false;
        }

        self.input.clear();
        self.push(Block::Question(question.clone()));

        let result = {
            let _overlay = self.ctx.overlay("Processing your question...");
            self.ctx
                .api
                .ask(&question, self.conversation_id.as_deref())
                .await
        };

        match result {
            Ok(reply) => {
                if self.conversation_id.as_deref() != Some(reply.conversation_id.as_str()) {
                    self.conversation_id = Some(reply.conversation_id.clone());
                }
                self.refresh_title().await;

                let chart = reply.chart_data.filter(|_| self.prefs.show_charts);
                self.push(Block::Answer {
                    content: reply.answer,
                    processing_time: reply.processing_time,
                    chart,
                });

                if self.prefs.show_follow_up && !reply.follow_up_suggestions.is_empty() {
                    self.ctx
                        .surface
                        .render(Region::FollowUps, &render::numbered(&reply.follow_up_suggestions));
                    self.follow_ups = reply.follow_up_suggestions;
                }

                self.refresh_recent().await;
                true
            }
            Err(e) => {
                self.push(Block::Error(e.user_message(ASK_FALLBACK)));
                false
            }
        }
    }

    /// Ask the backend to (re)load its data and models.
    pub async fn initialise(&mut self) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Initialising system...");
            self.ctx.api.initialise().await
        };

        match result {
            Ok(_) => {
                self.push(Block::System("System initialised successfully.".to_string()));

                let api = self.ctx.api;
                let (stats, samples) = futures::join!(api.stats(), api.sample_questions());
                self.show_stats(stats);
                self.show_samples(samples);

                self.toast(Level::Success, "System initialised successfully");
                true
            }
            Err(e) => {
                self.push(Block::Error(e.user_message("Failed to initialise system.")));
                let toast = match e.kind() {
                    ErrorKind::Api => "Initialisation failed",
                    ErrorKind::Network => "Network error",
                };
                self.toast(Level::Error, toast);
                false
            }
        }
    }

    /// Create a conversation and switch the page to it.
    pub async fn new_conversation(&mut self, title: Option<&str>) -> bool {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(default_conversation_title);

        let result = {
            let _overlay = self.ctx.overlay("Creating conversation...");
            self.ctx.api.create_conversation(&title).await
        };

        match result {
            Ok(id) => {
                self.conversation_id = Some(id);
                self.set_title(title);
                self.clear_display();
                self.refresh_recent().await;
                self.toast(Level::Success, "New conversation created");
                true
            }
            Err(e) => {
                let message = match e {
                    ApiError::Rejected { message, .. } => format!(
                        "Error creating conversation: {}",
                        message.filter(|m| !m.is_empty()).as_deref().unwrap_or("Unknown error")
                    ),
                    _ => NETWORK_ERROR_MESSAGE.to_string(),
                };
                self.toast(Level::Error, message);
                false
            }
        }
    }

    /// Clear the transcript on screen; the stored conversation is untouched.
    pub fn clear(&mut self) -> bool {
        if !self.ctx.surface.confirm(CLEAR_PROMPT) {
            return false;
        }
        self.clear_display();
        self.toast(Level::Info, "Conversation cleared");
        true
    }

    pub async fn export(&self, format: ConversationFormat) -> Option<PathBuf> {
        let Some(id) = self.conversation_id.as_deref() else {
            self.toast(Level::Warning, "No active conversation to export");
            return None;
        };

        let bytes = match self.ctx.api.export_conversation(id, format.as_str()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.toast(Level::Error, e.user_message("Failed to export conversation"));
                return None;
            }
        };

        match self.ctx.surface.deliver(format.artifact(bytes)) {
            Ok(path) => {
                self.toast(
                    Level::Success,
                    format!("Conversation exported as {}", format.as_str().to_uppercase()),
                );
                Some(path)
            }
            Err(e) => {
                self.toast(Level::Error, format!("Failed to save export: {}", e));
                None
            }
        }
    }

    /// Replay a stored conversation and make it the backend's active one.
    pub async fn load_conversation(&mut self, id: &str) -> bool {
        let _overlay = self.ctx.overlay("Loading conversation...");

        let conversation = match self.ctx.api.conversation(id).await {
            Ok(conversation) => conversation,
            Err(e) => {
                let message = match e.kind() {
                    ErrorKind::Api => "Error loading conversation",
                    ErrorKind::Network => NETWORK_ERROR_MESSAGE,
                };
                self.toast(Level::Error, message);
                return false;
            }
        };

        self.conversation_id = Some(id.to_string());
        self.set_title(conversation.title);
        self.replay(&conversation.messages);

        if let Err(e) = self.ctx.api.activate_conversation(id).await {
            tracing::warn!(error = %e, conversation = id, "failed to activate conversation");
        }
        self.refresh_recent().await;
        true
    }

    fn replay(&mut self, messages: &[Message]) {
        self.blocks = messages
            .iter()
            .filter_map(|m| match m.role() {
                Role::User => Some(Block::Question(m.content.clone())),
                Role::Assistant => Some(Block::Answer {
                    content: m.content.clone(),
                    processing_time: m.processing_time.unwrap_or(0.0),
                    chart: m.chart_data.clone().filter(|_| self.prefs.show_charts),
                }),
                Role::System => Some(Block::System(m.content.clone())),
                Role::Other => None,
            })
            .collect();
        self.follow_ups.clear();
        self.render_transcript();
    }

    pub fn toggle_dark_mode(&mut self, store: &mut PreferenceStore) -> Result<bool, InsightsError> {
        let dark = self.prefs.toggle_dark_mode(store)?;
        self.ctx.surface.apply_preferences(&self.prefs);
        Ok(dark)
    }
}
