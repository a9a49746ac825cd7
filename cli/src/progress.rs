//! Stage progress on stderr

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ragloop_application::WorkflowProgress;
use ragloop_domain::{Intent, Stage};
use std::time::Duration;

/// Spinner showing the current workflow stage
pub struct ProgressReporter {
    spinner: ProgressBar,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Self { spinner }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn stage_display_name(stage: Stage) -> &'static str {
        match stage {
            Stage::ClassifyCoarse => "Classifying",
            Stage::Retrieve => "Retrieving",
            Stage::AssessQuality => "Assessing evidence",
            Stage::Refine => "Refining query",
            Stage::ClassifyFinal => "Routing",
            Stage::Synthesize => "Generating",
            Stage::Validate => "Validating",
            Stage::Repair => "Repairing",
            Stage::Done => "Done",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowProgress for ProgressReporter {
    fn on_stage(&self, stage: Stage, retry_count: u32) {
        self.spinner
            .set_prefix(Self::stage_display_name(stage).to_string());
        if retry_count > 0 {
            self.spinner.set_message(format!("(retry {})", retry_count));
        }
    }

    fn on_query_refined(&self, query: &str, retry_count: u32) {
        self.spinner.println(format!(
            "  {} retry {}: {}",
            "->".cyan(),
            retry_count,
            query.dimmed()
        ));
    }

    fn on_run_complete(&self, intent: Intent, confidence: f64) {
        self.spinner.finish_and_clear();
        self.spinner.println(format!(
            "{} {} ({:.2})",
            "v".green(),
            intent.as_str().bold(),
            confidence
        ));
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
