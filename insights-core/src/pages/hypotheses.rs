//! Hypothesis generation, testing and insight synthesis.
//!
//! Tested state is volatile and keyed by hypothesis id: regenerating the
//! list never duplicates or forgets a tested entry.

use std::collections::HashSet;
use std::path::PathBuf;

use super::PageContext;
use crate::error::ErrorKind;
use crate::export::InsightsFormat;
use crate::models::{Hypothesis, TestedHypothesis};
use crate::render;
use crate::surface::{Level, Region};

/// Insights are synthesized once this many hypotheses have been tested.
pub const SYNTHESIS_THRESHOLD: usize = 2;

pub const TEST_PROMPT: &str = "Test this hypothesis against the active dataset?";
pub const RESET_PROMPT: &str =
    "Are you sure you want to reset? This will clear all hypotheses and results.";

pub struct HypothesisPage<'a> {
    ctx: PageContext<'a>,
    hypotheses: Vec<Hypothesis>,
    tested: Vec<TestedHypothesis>,
    insights: Option<String>,
}

impl<'a> HypothesisPage<'a> {
    pub fn new(ctx: PageContext<'a>) -> Self {
        Self {
            ctx,
            hypotheses: Vec::new(),
            tested: Vec::new(),
            insights: None,
        }
    }

    pub fn hypotheses(&self) -> &[Hypothesis] {
        &self.hypotheses
    }

    /// Tested hypotheses in the order they were tested.
    pub fn tested(&self) -> &[TestedHypothesis] {
        &self.tested
    }

    pub fn insights(&self) -> Option<&str> {
        self.insights.as_deref()
    }

    pub fn is_tested(&self, id: &str) -> bool {
        self.tested.iter().any(|t| t.id == id)
    }

    pub async fn load_dataset_info(&self) {
        match self.ctx.api.stats().await {
            Ok(stats) => {
                let view = format!("{}\n\n{}", render::current_dataset(&stats), render::stats(&stats));
                self.ctx.surface.render(Region::Stats, &view);
            }
            Err(e) => {
                let banner = match e.kind() {
                    ErrorKind::Api => "Failed to load dataset information",
                    ErrorKind::Network => "Network error when loading dataset information",
                };
                self.ctx.surface.render(Region::Stats, banner);
            }
        }
    }

    fn render_list(&self) {
        let tested: HashSet<&str> = self.tested.iter().map(|t| t.id.as_str()).collect();
        self.ctx
            .surface
            .render(Region::Hypotheses, &render::hypotheses(&self.hypotheses, &tested));
    }

    fn render_results(&self) {
        let view = self
            .tested
            .iter()
            .map(|t| render::test_result(&t.title, &t.result))
            .collect::<Vec<_>>()
            .join("\n\n");
        self.ctx.surface.render(Region::TestResults, &view);
    }

    /// Replace the hypothesis list with a fresh batch from the backend.
    pub async fn generate(&mut self) -> bool {
        let result = {
            let _overlay = self.ctx.overlay("Generating hypotheses...");
            self.ctx.api.generate_hypotheses().await
        };

        match result {
            Ok(hypotheses) => {
                self.hypotheses = hypotheses;
                self.render_list();
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to generate hypotheses"));
                false
            }
        }
    }

    /// Test one hypothesis; synthesizes insights once enough are tested.
    pub async fn test(&mut self, id: &str) -> bool {
        let Some(hypothesis) = self.hypotheses.iter().find(|h| h.id == id).cloned() else {
            self.ctx.toast(Level::Error, "Hypothesis not found");
            return false;
        };
        if self.is_tested(id) {
            self.ctx.toast(Level::Warning, "Hypothesis already tested");
            return false;
        }
        if !self.ctx.surface.confirm(TEST_PROMPT) {
            return false;
        }

        let result = {
            let _overlay = self.ctx.overlay("Testing hypothesis...");
            self.ctx.api.test_hypothesis(&hypothesis).await
        };

        match result {
            Ok(result) => {
                tracing::debug!(id = %hypothesis.id, "hypothesis tested");
                self.tested.push(TestedHypothesis::from_result(&hypothesis, result));
                self.render_results();
                self.render_list();

                if self.tested.len() >= SYNTHESIS_THRESHOLD {
                    self.synthesize().await;
                }
                true
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to test hypothesis"));
                false
            }
        }
    }

    async fn synthesize(&mut self) {
        let result = {
            let _overlay = self.ctx.overlay("Synthesizing insights...");
            self.ctx.api.synthesize_insights(&self.tested).await
        };

        match result {
            Ok(insights) => {
                self.ctx.surface.render(Region::Insights, &insights);
                self.insights = Some(insights);
            }
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to synthesize insights"));
            }
        }
    }

    /// Clear all hypotheses, results and insights after confirmation.
    pub fn reset(&mut self) -> bool {
        if !self.ctx.surface.confirm(RESET_PROMPT) {
            return false;
        }
        self.hypotheses.clear();
        self.tested.clear();
        self.insights = None;
        for region in [Region::Hypotheses, Region::TestResults, Region::Insights] {
            self.ctx.surface.render(region, "");
        }
        true
    }

    /// Export the synthesized insights. PDF opens in a viewer; the rest download.
    pub async fn export(&self, format: InsightsFormat) -> Option<PathBuf> {
        let Some(insights) = self.insights.as_deref() else {
            self.ctx.toast(Level::Warning, "No insights to export");
            return None;
        };

        let result = {
            let _overlay = self.ctx.overlay("Exporting insights...");
            self.ctx.api.export_insights(insights, format.as_str()).await
        };

        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                self.ctx.toast(Level::Error, e.user_message("Failed to export insights"));
                return None;
            }
        };

        match self.ctx.surface.deliver(format.artifact(bytes)) {
            Ok(path) => {
                self.ctx.toast(Level::Success, "Insights exported successfully");
                Some(path)
            }
            Err(e) => {
                self.ctx.toast(Level::Error, format!("Failed to save export: {}", e));
                None
            }
        }
    }
}
