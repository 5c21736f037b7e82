use serde::{Deserialize, Serialize};

use super::ChartData;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub message_count: u64,
}

/// Body of `GET /api/conversations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationListing {
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
    #[serde(default)]
    pub current_conversation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub chart_data: Option<ChartData>,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

impl Message {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    System,
    Other,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            _ => Role::Other,
        }
    }
}

/// Success body of `POST /api/ask`.
#[derive(Debug, Clone, Deserialize)]
pub struct AskReply {
    pub conversation_id: String,
    pub answer: String,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub chart_data: Option<ChartData>,
    #[serde(default)]
    pub follow_up_suggestions: Vec<String>,
}
