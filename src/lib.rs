pub mod archive;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod extractor;
pub mod locator;
pub mod pipeline;
pub mod results;
pub mod server;
pub mod ui;

#[cfg(test)]
mod test_support;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{ArchiveConfig, CliOverrides, Config, ServerConfig, StorageConfig};
pub use error::{FollowbackError, Result, UserFriendlyError};

// Core functionality re-exports
pub use archive::{UnpackReport, ZipUnpacker};
pub use diff::{diff, DiffResult};
pub use extractor::{Identifier, IdentifierExtractor, MembershipSet, Role};
pub use locator::{DocumentLocator, ExportDocument, LocatedDocuments};
pub use pipeline::{Pipeline, ScanOutcome, ScanSummary, Stage, Upload, UploadFile};
pub use results::{ResultArtifact, ResultStore};
pub use server::{build_router, AppState};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use std::time::Instant;

/// Local, one-shot front end over the [`Pipeline`]: progress on the
/// terminal, Ctrl+C cancellation and formatted results.
pub struct Followback {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl Followback {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// No signal handler is installed, so tests can build many instances.
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, 0, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli, output_format: OutputFormat) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Runs a local archive through the pipeline and prints the outcome.
    /// The archive itself is never modified or removed.
    pub async fn check_archive(&self, archive: &Path) -> Result<ScanOutcome> {
        self.shutdown.check_shutdown()?;

        if !archive.is_file() {
            return Err(FollowbackError::InvalidInput {
                reason: format!("{} is not a readable file", archive.display()),
            });
        }

        self.output_formatter
            .start_operation(&format!("Checking {}", archive.display()));

        let spinner = self.progress_manager.create_stage_spinner();
        let pipeline = {
            let pb = spinner.clone();
            Pipeline::new(&self.config)?
                .with_progress(move |stage| ui::progress::update_stage_progress(&pb, stage))
                .with_cancellation(self.shutdown.running_flag())
        };

        let started = Instant::now();
        let result = pipeline.process(Upload::local(archive)).await;

        match result {
            Ok(ref outcome) => {
                ui::progress::finish_progress_with_summary(
                    &spinner,
                    "Scan finished",
                    started.elapsed(),
                );
                self.output_formatter.print_scan_outcome(outcome);
            }
            Err(_) => spinner.abandon_with_message("Scan failed"),
        }

        result
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        std::fs::write(output_path.as_ref(), Config::create_sample_config())?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &FollowbackError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Checks an archive with the given configuration and no terminal output.
pub async fn find_non_followers(archive: &Path, config: &Config) -> Result<ScanOutcome> {
    config.validate()?;
    Pipeline::new(config)?.process(Upload::local(archive)).await
}
