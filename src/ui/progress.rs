use crate::pipeline::Stage;
use crate::ui::output::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
        );
        pb.set_message(message.to_string());
        pb
    }

    /// Spinner that follows a pipeline run, one message per stage.
    pub fn create_stage_spinner(&self) -> ProgressBar {
        self.create_spinner(Stage::Received.activity())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Shows the work that follows `stage`; the spinner stays up until the caller
/// finishes it.
pub fn update_stage_progress(pb: &ProgressBar, stage: Stage) {
    let next = match stage {
        Stage::Received => Stage::Validated,
        Stage::Validated => Stage::Unpacked,
        Stage::Unpacked => Stage::Located,
        Stage::Located => Stage::Extracted,
        Stage::Extracted => Stage::Diffed,
        Stage::Diffed => Stage::Persisted,
        Stage::Persisted => Stage::Rendered,
        Stage::Rendered | Stage::Failed => Stage::CleanedUp,
        Stage::CleanedUp => return,
    };
    pb.set_message(format!("{}...", next.activity()));
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_manager_hands_out_hidden_bars() {
        let manager = ProgressManager::new(false);
        assert!(!manager.is_enabled());
        assert!(manager.create_spinner("working").is_hidden());
        assert!(manager.create_stage_spinner().is_hidden());
    }

    #[test]
    fn test_stage_updates_describe_next_step() {
        let pb = ProgressBar::hidden();

        update_stage_progress(&pb, Stage::Validated);
        assert_eq!(pb.message(), "Unpacking archive...");

        update_stage_progress(&pb, Stage::Failed);
        assert_eq!(pb.message(), "Removing temporary files...");

        update_stage_progress(&pb, Stage::CleanedUp);
        assert_eq!(pb.message(), "Removing temporary files...");
    }

    #[test]
    fn test_finish_with_summary() {
        let pb = ProgressBar::hidden();
        finish_progress_with_summary(&pb, "Scan finished", Duration::from_secs(2));
        assert!(pb.is_finished());
        assert_eq!(pb.message(), "Scan finished (completed in 2s)");
    }
}
