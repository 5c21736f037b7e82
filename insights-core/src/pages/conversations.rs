//! Conversation management: search, paginate, inspect, create, delete, export.

use std::path::PathBuf;

use super::PageContext;
use crate::error::{ErrorKind, NETWORK_ERROR_MESSAGE};
use crate::export::ConversationFormat;
use crate::models::{Conversation, ConversationSummary};
use crate::render;
use crate::surface::{Level, Region};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this conversation? This action cannot be undone.";

pub struct ConversationsPage<'a> {
    ctx: PageContext<'a>,
    conversations: Vec<ConversationSummary>,
    search: String,
    page: usize,
    selected: Option<String>,
    details: Option<Conversation>,
}

impl<'a> ConversationsPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self {
            ctx,
            conversations: Vec::new(),
            search: String::new(),
            page: 1,
            selected: None,
            details: None,
        }
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn details(&self) -> Option<&Conversation> {
        self.details.as_ref()
    }

    /// Conversations whose title contains the search text, ignoring case.
    pub fn filtered(&self) -> Vec<&ConversationSummary> {
        let query = self.search.to_lowercase();
        self.conversations
            .iter()
            .filter(|c| query.is_empty() || c.title.to_lowercase().contains(&query))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(self.ctx.ui.page_size.max(1))
    }

    /// The conversations shown on the current page.
    pub fn visible(&self) -> Vec<&ConversationSummary> {
        let size = self.ctx.ui.page_size.max(1);
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * size)
            .take(size)
            .collect()
    }

    fn display(&self) {
        if self.conversations.is_empty() {
            self.ctx.surface.render(
                Region::ConversationList,
                "No conversations yet. Start a new conversation to begin.",
            );
            self.ctx.surface.render(Region::Pagination, "");
            return;
        }

        let visible = self.visible();
        if visible.is_empty() {
            self.ctx.surface.render(
                Region::ConversationList,
                "No conversations found matching your search criteria.",
            );
            self.ctx.surface.render(Region::Pagination, "");
            return;
        }

        self.ctx
            .surface
            .render(Region::ConversationList, &render::conversation_list(&visible));
        self.ctx
            .surface
            .render(Region::Pagination, &render::pagination(self.page, self.total_pages()));
    }

    pub async fn load(&mut self) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Loading conversations...");
            self.ctx.api.list_conversations().await
        };

        match result {
            Ok(listing) => {
                self.conversations = listing.conversations;
                self.page = self.page.clamp(1, self.total_pages().max(1));
                if self.conversations.is_empty() {
                    self.details = None;
                    self.ctx.surface.render(Region::ConversationDetails, "");
                }
                self.display();
                true
            }
            Err(e) => {
                let message = match e.kind() {
                    ErrorKind::Api => "Failed to load conversations",
                    ErrorKind::Network => NETWORK_ERROR_MESSAGE,
                };
                self.ctx.toast(Level::Error, message);
                false
            }
        }
    }

    /// Filter by title and go back to the first page.
    pub fn search(&mut self, query: &str) {
        self.search = query.trim().to_string();
        self.page = 1;
        self.display();
    }

    /// Out-of-range pages are ignored.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page < 1 || page > self.total_pages() {
            return false;
        }
        self.page = page;
        self.display();
        true
    }

    pub async fn view(&mut self, id: &str) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Loading conversation details...");
            self.ctx.api.conversation(id).await
        };

        let conversation = match result {
            Ok(conversation) => conversation,
            Err(e) => {
                self.ctx
                    .toast(Level::Error, e.user_message("Failed to load conversation details"));
                return false;
            }
        };

        let dataset_name = self.dataset_name(conversation.dataset_id.as_deref()).await;
        let view = format!(
            "{}\n\n{}",
            render::conversation_details(&conversation, &dataset_name),
            render::conversation_preview(&conversation.messages, self.ctx.ui.preview_chars)
        );
        self.ctx.surface.render(Region::ConversationDetails, &view);

        self.selected = Some(conversation.id.clone());
        self.details = Some(conversation);
        true
    }

    async fn dataset_name(&self, dataset_id: Option<&str>) -> String {
        let Some(dataset_id) = dataset_id else {
            return "Default dataset".to_string();
        };
        match self.ctx.api.list_datasets().await {
            Ok(listing) => listing
                .find(dataset_id)
                .map(|d| d.name.clone())
                .unwrap_or_else(|| "Unknown dataset".to_string()),
            Err(e) => {
                tracing::debug!(error = %e, "dataset lookup failed");
                "Unknown dataset".to_string()
            }
        }
    }

    /// Create a conversation; returns its id so the caller can open it.
    pub async fn create(&mut self, title: Option<&str>) -> Option<String> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(super::chat::default_conversation_title);

        let result = {
            let _overlay = self.ctx.overlay("Creating conversation...");
            self.ctx.api.create_conversation(&title).await
        };

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                self.ctx
                    .toast(Level::Error, e.user_message("Failed to create conversation"));
                None
            }
        }
    }

    /// Delete `id`, or the selected conversation when `id` is `None`.
    pub async fn delete(&mut self, id: Option<&str>) -> bool {
        if let Some(id) = id {
            self.selected = Some(id.to_string());
        }
        let Some(target) = self.selected.clone() else {
            self.ctx.toast(Level::Error, "No conversation selected");
            return false;
        };
        if !self.ctx.surface.confirm(DELETE_PROMPT) {
            return false;
        }

        let result = {
            let _overlay = self.ctx.overlay("Deleting conversation...");
            self.ctx.api.delete_conversation(&target).await
        };

        match result {
            Ok(_) => {
                self.load().await;
                self.selected = None;
                self.details = None;
                self.ctx.surface.render(Region::ConversationDetails, "");
                self.ctx.toast(Level::Success, "Conversation deleted successfully");
                true
            }
            Err(e) => {
                self.ctx
                    .toast(Level::Error, e.user_message("Failed to delete conversation"));
                false
            }
        }
    }

    pub async fn export(&self, format: ConversationFormat) -> Option<PathBuf> {
        let Some(id) = self.selected.as_deref() else {
            self.ctx.toast(Level::Error, "No conversation selected");
            return None;
        };

        let bytes = match self.ctx.api.export_conversation(id, format.as_str()).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.ctx
                    .toast(Level::Error, e.user_message("Failed to export conversation"));
                return None;
            }
        };

        match self.ctx.surface.deliver(format.artifact(bytes)) {
            Ok(path) => {
                self.ctx.toast(
                    Level::Success,
                    format!("Conversation exported as {}", format.as_str().to_uppercase()),
                );
                Some(path)
            }
            Err(e) => {
                self.ctx.toast(Level::Error, format!("Failed to save export: {}", e));
                None
            }
        }
    }
}
