//! Export formats and how each one reaches the user.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bytes::Bytes;

use crate::error::InsightsError;

/// Download saves a file; Open hands the document to a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Download,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Bytes,
    pub delivery: Delivery,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, replacing any file of the same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, InsightsError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| InsightsError::Export(format!("{}: {}", dir.display(), e)))?;
        let target = dir.join(&self.file_name);
        std::fs::write(&target, &self.bytes)
            .map_err(|e| InsightsError::Export(format!("{}: {}", target.display(), e)))?;
        Ok(target)
    }
}

// ============================================================================
// Insights
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightsFormat {
    Json,
    Markdown,
    Txt,
    Html,
    Pdf,
}

impl InsightsFormat {
    pub const ALL: [InsightsFormat; 5] = [
        InsightsFormat::Json,
        InsightsFormat::Markdown,
        InsightsFormat::Txt,
        InsightsFormat::Html,
        InsightsFormat::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightsFormat::Json => "json",
            InsightsFormat::Markdown => "markdown",
            InsightsFormat::Txt => "txt",
            InsightsFormat::Html => "html",
            InsightsFormat::Pdf => "pdf",
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            InsightsFormat::Pdf => Delivery::Open,
            _ => Delivery::Download,
        }
    }

    pub fn file_name(&self) -> String {
        format!("financial_insights.{}", self.as_str())
    }

    pub fn artifact(&self, bytes: Bytes) -> ExportArtifact {
        ExportArtifact {
            file_name: self.file_name(),
            bytes,
            delivery: self.delivery(),
        }
    }
}

impl fmt::Display for InsightsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightsFormat {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let wanted = if wanted == "md" { "markdown".to_string() } else { wanted };
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| InsightsError::Validation(format!("unsupported insights format '{}'", s)))
    }
}

// ============================================================================
// Conversations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationFormat {
    Json,
    Markdown,
    Csv,
    Html,
}

impl ConversationFormat {
    pub const ALL: [ConversationFormat; 4] = [
        ConversationFormat::Json,
        ConversationFormat::Markdown,
        ConversationFormat::Csv,
        ConversationFormat::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationFormat::Json => "json",
            ConversationFormat::Markdown => "markdown",
            ConversationFormat::Csv => "csv",
            ConversationFormat::Html => "html",
        }
    }

    pub fn file_name(&self) -> String {
        format!("conversation_export.{}", self.as_str())
    }

    pub fn artifact(&self, bytes: Bytes) -> ExportArtifact {
        ExportArtifact {
            file_name: self.file_name(),
            bytes,
            delivery: Delivery::Download,
        }
    }
}

impl fmt::Display for ConversationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationFormat {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let wanted = if wanted == "md" { "markdown".to_string() } else { wanted };
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                InsightsError::Validation(format!("unsupported conversation format '{}'", s))
            })
    }
}
