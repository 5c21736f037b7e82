//! Plain-text views of backend data.
//!
//! Every function here is pure: data in, `String` out. Controllers decide
//! which region the text replaces.

use std::collections::HashSet;
use std::fmt::Write as _;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::models::{
    ChartData, Conversation, ConversationSummary, DatasetListing, Hypothesis, Importance, Message,
    Role, Stats, SystemSettings,
};
use crate::prefs::UserPreferences;

pub const EMPTY_CONVERSATION: &str = "Ask a question to start the conversation";

// ============================================================================
// Number and date formatting
// ============================================================================

/// Thousands-separated integer, e.g. `9,994`.
pub fn format_count(n: u64) -> String {
    group_thousands(&n.to_string())
}

/// Whole-dollar USD amount, e.g. `$2,297,201` or `-$1,204`.
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    // The backend writes naive ISO timestamps in its own local time.
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

fn format_with(raw: &str, fmt: &str) -> String {
    match parse_timestamp(raw) {
        Some(dt) => dt.format(fmt).to_string(),
        None => raw.to_string(),
    }
}

pub fn format_date(raw: &str) -> String {
    format_with(raw, "%Y-%m-%d")
}

pub fn format_datetime(raw: &str) -> String {
    format_with(raw, "%Y-%m-%d %H:%M")
}

pub fn format_time(raw: &str) -> String {
    format_with(raw, "%H:%M:%S")
}

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

// ============================================================================
// Datasets and stats
// ============================================================================

pub fn datasets(listing: &DatasetListing) -> String {
    if listing.datasets.is_empty() {
        return "No custom datasets available. Upload a dataset to get started.".to_string();
    }

    let mut out = String::new();
    for dataset in &listing.datasets {
        let marker = if listing.is_active(&dataset.id) { "[Active]" } else { "[ Use  ]" };
        let added = dataset.date_added.as_deref().map(format_date).unwrap_or_default();
        let last_used = dataset
            .last_used
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| "Never".to_string());

        let _ = writeln!(out, "{} {}  ({})", marker, dataset.name, dataset.id);
        if let Some(description) = dataset.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "         {}", description);
        }
        let _ = writeln!(out, "         Added: {} \u{2022} Last used: {}", added, last_used);
    }
    out
}

pub fn current_dataset(stats: &Stats) -> String {
    match &stats.current_dataset {
        Some(dataset) => match dataset.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!("{}\n{}", dataset.name, description),
            None => dataset.name.clone(),
        },
        None => "Default dataset".to_string(),
    }
}

pub fn stats(stats: &Stats) -> String {
    format!(
        "Total Records  {}\nTotal Sales    {}\nTotal Profit   {}",
        format_count(stats.total_rows),
        format_currency(stats.total_sales),
        format_currency(stats.total_profit)
    )
}

pub fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Hypotheses
// ============================================================================

fn importance_badge(hypothesis: &Hypothesis) -> String {
    let label = match hypothesis.importance_level() {
        Importance::High => "HIGH",
        Importance::Medium => "MEDIUM",
        Importance::Low => "LOW",
        Importance::Other => "UNRATED",
    };
    format!("[{}]", label)
}

/// One card per hypothesis; tested ones are marked by id.
pub fn hypotheses(list: &[Hypothesis], tested: &HashSet<&str>) -> String {
    let mut out = String::new();
    for (index, hypothesis) in list.iter().enumerate() {
        let state = if tested.contains(hypothesis.id.as_str()) { "[Tested]" } else { "[Test]" };
        let _ = writeln!(
            out,
            "Hypothesis {}: {} {}",
            index + 1,
            hypothesis.title,
            state
        );
        let _ = writeln!(out, "  {}", hypothesis.description);
        let _ = writeln!(
            out,
            "  {} {} Importance \u{2022} Confidence: {}",
            importance_badge(hypothesis),
            hypothesis.importance,
            hypothesis.confidence_label()
        );
    }
    out
}

pub fn test_result(title: &str, result: &str) -> String {
    format!("Test Results: {}\n{}", title, result)
}

// ============================================================================
// Chat transcript
// ============================================================================

/// One rendered unit of the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Question(String),
    Answer {
        content: String,
        processing_time: f64,
        chart: Option<ChartData>,
    },
    Error(String),
    System(String),
}

impl Block {
    pub fn render(&self) -> String {
        match self {
            Block::Question(text) => format!("You\n{}", text),
            Block::Answer {
                content,
                processing_time,
                chart,
            } => {
                let mut out = format!("Cbus Financial Insights\n{}", content);
                if let Some(chart) = chart.as_ref().filter(|c| c.is_image()) {
                    let _ = write!(out, "\n[Chart: {}]", chart.display_title());
                }
                let _ = write!(out, "\nProcessed in {} seconds", processing_time);
                out
            }
            Block::Error(text) => format!("Error\n{}", text),
            Block::System(text) => format!("System:\n{}", text),
        }
    }
}

pub fn transcript(blocks: &[Block]) -> String {
    if blocks.is_empty() {
        return EMPTY_CONVERSATION.to_string();
    }
    blocks
        .iter()
        .map(Block::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn recent_conversations(list: &[ConversationSummary], current_id: Option<&str>) -> String {
    if list.is_empty() {
        return "No conversations yet".to_string();
    }
    list.iter()
        .map(|conv| {
            let marker = if Some(conv.id.as_str()) == current_id { "*" } else { " " };
            format!(
                "{} {}  {} \u{2022} {} messages  ({})",
                marker,
                conv.title,
                format_date(&conv.updated_at),
                conv.message_count,
                conv.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Conversation management
// ============================================================================

pub fn conversation_list(page: &[&ConversationSummary]) -> String {
    page.iter()
        .map(|conv| {
            format!(
                "{}  ({})\n  {} \u{2022} {} messages",
                conv.title,
                conv.id,
                format_datetime(&conv.updated_at),
                conv.message_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `« 1 [2] 3 »`; empty when everything fits on one page.
pub fn pagination(current: usize, total: usize) -> String {
    if total <= 1 {
        return String::new();
    }
    let mut parts = vec![if current == 1 { "(\u{ab})".to_string() } else { "\u{ab}".to_string() }];
    for page in 1..=total {
        if page == current {
            parts.push(format!("[{}]", page));
        } else {
            parts.push(page.to_string());
        }
    }
    parts.push(if current == total { "(\u{bb})".to_string() } else { "\u{bb}".to_string() });
    parts.join(" ")
}

pub fn conversation_details(conversation: &Conversation, dataset_name: &str) -> String {
    format!(
        "{}\nCreated:  {}\nUpdated:  {}\nDataset:  {}\nMessages: {}",
        conversation.title,
        format_datetime(&conversation.created_at),
        format_datetime(&conversation.updated_at),
        dataset_name,
        conversation.messages.len()
    )
}

/// First three and last two messages when there are more than five.
pub fn conversation_preview(messages: &[Message], preview_chars: usize) -> String {
    if messages.is_empty() {
        return "No messages in this conversation".to_string();
    }

    let shown: Vec<&Message> = if messages.len() > 5 {
        messages[..3].iter().chain(messages[messages.len() - 2..].iter()).collect()
    } else {
        messages.iter().collect()
    };
    let hidden = messages.len().saturating_sub(5);

    let mut parts = Vec::with_capacity(shown.len() + 1);
    for (index, message) in shown.iter().enumerate() {
        if index == 3 && hidden > 0 {
            parts.push(format!("... {} more messages ...", hidden));
        }
        let role = match message.role() {
            Role::User => "User",
            Role::Assistant => "AI Assistant",
            Role::System => "System",
            Role::Other => message.role.as_str(),
        };
        parts.push(format!(
            "{} {}\n{}",
            role,
            format_time(&message.timestamp),
            truncate(&message.content, preview_chars)
        ));
    }
    parts.join("\n\n")
}

// ============================================================================
// Settings
// ============================================================================

pub fn system_settings(settings: &SystemSettings) -> String {
    format!(
        "Analyst deployment:  {}\nInsight deployment:  {}\nCache duration:      {} days\nMemory cache size:   {} items",
        settings.analyst_deployment,
        settings.insight_deployment,
        settings.cache_duration,
        settings.memcache_size
    )
}

pub fn interface_settings(prefs: &UserPreferences) -> String {
    let on_off = |flag: bool| if flag { "on" } else { "off" };
    format!(
        "Dark mode:             {}\nFont size:             {}\nCharts in answers:     {}\nFollow-up suggestions: {}",
        on_off(prefs.dark_mode),
        prefs.font_size,
        on_off(prefs.show_charts),
        on_off(prefs.show_follow_up)
    )
}
