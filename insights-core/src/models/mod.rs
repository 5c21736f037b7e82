//! Serde mirrors of the JSON the insights backend returns.
//!
//! The backend owns every entity; these types only live long enough to be
//! rendered. Unknown fields are ignored and optional fields default.

pub mod chart;
pub mod conversation;
pub mod dataset;
pub mod hypothesis;
pub mod settings;
pub mod stats;

pub use chart::ChartData;
pub use conversation::{AskReply, Conversation, ConversationListing, ConversationSummary, Message, Role};
pub use dataset::{Dataset, DatasetListing};
pub use hypothesis::{Hypothesis, Importance, TestedHypothesis};
pub use settings::SystemSettings;
pub use stats::Stats;

use serde::{Deserialize, Deserializer};

/// Accepts `"h1"` and `1` alike; ids are compared as strings.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}
