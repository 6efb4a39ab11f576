use crate::error::{FollowbackError, UserFriendlyError};
use crate::pipeline::{ScanOutcome, ScanSummary};
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static PARTY: Emoji = Emoji("🎉 ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human if self.use_colors => {
                eprintln!("{}{}", CROSS, style(message).red().bold())
            }
            OutputMode::Human => eprintln!("✗ {}", message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &FollowbackError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// Prints the outcome of a scan. The account list is printed even in
    /// quiet mode because it is the command's actual result.
    pub fn print_scan_outcome(&self, outcome: &ScanOutcome) {
        match self.mode {
            OutputMode::Human => self.print_human_outcome(outcome),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "result",
                "result": outcome,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            OutputMode::Plain => self.print_plain_outcome(outcome),
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_separator(&self) {
        if self.use_colors {
            println!("{}", style("─".repeat(60)).dim());
        } else {
            println!("{}", "-".repeat(60));
        }
    }

    fn print_human_outcome(&self, outcome: &ScanOutcome) {
        if !self.quiet {
            println!();
            self.print_separator();
        }

        match outcome {
            ScanOutcome::AllFollowBack { .. } => {
                if self.use_colors {
                    println!(
                        "{}{}",
                        PARTY,
                        style("Everyone you follow follows you back!").green().bold()
                    );
                } else {
                    println!("Everyone you follow follows you back!");
                }
            }
            ScanOutcome::NotFollowingBack {
                accounts, artifact, ..
            } => {
                let heading = format!("{} accounts don't follow you back:", accounts.len());
                if self.use_colors {
                    println!("{}", style(heading).yellow().bold());
                } else {
                    println!("{}", heading);
                }
                println!();
                for account in accounts {
                    println!("  @{}", account);
                }
                println!();
                println!("Saved to: {}", artifact.path.display());
            }
        }

        if !self.quiet {
            self.print_summary_lines(outcome.summary());
            self.print_separator();
        }
    }

    fn print_summary_lines(&self, summary: &ScanSummary) {
        let value = |text: String| {
            if self.use_colors {
                style(text).cyan().bold().to_string()
            } else {
                text
            }
        };

        println!();
        println!("  Following:       {}", value(summary.following.to_string()));
        println!("  Followers:       {}", value(summary.followers.to_string()));
        if summary.follower_pages > 1 {
            println!("  Follower pages:  {}", value(summary.follower_pages.to_string()));
        }
        println!(
            "  Archive size:    {}",
            value(format_bytes(summary.unpacked_bytes))
        );
        println!(
            "  Time taken:      {}",
            value(format_duration(Duration::from_millis(summary.elapsed_ms)))
        );
    }

    fn print_plain_outcome(&self, outcome: &ScanOutcome) {
        match outcome {
            ScanOutcome::AllFollowBack { .. } => {
                println!("RESULT: all followed accounts follow back");
            }
            ScanOutcome::NotFollowingBack {
                accounts, artifact, ..
            } => {
                println!("RESULT: {} accounts not following back", accounts.len());
                for account in accounts {
                    println!("@{}", account);
                }
                println!("ARTIFACT: {}", artifact.path.display());
            }
        }

        if !self.quiet {
            let summary = outcome.summary();
            println!("Following: {}", summary.following);
            println!("Followers: {}", summary.followers);
            println!("Duration: {}ms", summary.elapsed_ms);
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
