use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "followback")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find the accounts you follow that don't follow you back")]
#[command(
    long_about = "followback reads the data export of a social account (a .zip archive), \
                  compares the \"following\" list against the \"followers\" list and reports \
                  every account that does not follow back. Run it as a small web app with \
                  `serve`, or on a local archive with `check`."
)]
#[command(after_help = "EXAMPLES:\n  \
    followback serve\n  \
    followback serve --bind 127.0.0.1 --port 8080\n  \
    followback check ~/Downloads/instagram-export.zip\n  \
    followback check export.zip --output-format json --results-dir ./out\n  \
    followback --generate-config --config followback.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Where result lists are written
    #[arg(long, global = true, env = "FOLLOWBACK_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Where uploads and scratch directories live
    #[arg(long, global = true, env = "FOLLOWBACK_UPLOADS_DIR")]
    pub uploads_dir: Option<PathBuf>,

    /// Platform domain used in profile links (e.g. instagram.com)
    #[arg(long, global = true)]
    pub domain: Option<String>,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the upload web app
    Serve {
        /// Address to bind
        #[arg(long, env = "FOLLOWBACK_BIND")]
        bind: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "FOLLOWBACK_PORT")]
        port: Option<u16>,
    },
    /// Check a local export archive
    Check {
        /// Path to the .zip export
        archive: PathBuf,

        /// Output format for results
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        output_format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let (bind, port) = match self.command {
            Some(Command::Serve { ref bind, port }) => (bind.clone(), port),
            _ => (None, None),
        };

        CliOverrides::new()
            .with_bind(bind)
            .with_port(port)
            .with_uploads_dir(self.uploads_dir.clone())
            .with_results_dir(self.results_dir.clone())
            .with_platform_domain(self.domain.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "followback",
            "serve",
            "--bind",
            "127.0.0.1",
            "--port",
            "8080",
            "--results-dir",
            "/tmp/results",
        ])
        .unwrap();

        let overrides = cli.create_cli_overrides();
        assert_eq!(overrides.bind.as_deref(), Some("127.0.0.1"));
        assert_eq!(overrides.port, Some(8080));
        assert_eq!(overrides.results_dir, Some(PathBuf::from("/tmp/results")));
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "followback",
            "-vv",
            "check",
            "export.zip",
            "--output-format",
            "json",
            "--domain",
            "example.com",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Check {
                ref archive,
                output_format,
            }) => {
                assert_eq!(archive, &PathBuf::from("export.zip"));
                assert!(matches!(output_format, OutputFormat::Json));
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.verbosity_level(), 2);
        assert_eq!(cli.domain.as_deref(), Some("example.com"));

        let overrides = cli.create_cli_overrides();
        assert!(overrides.port.is_none());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["followback", "-q", "-v", "check", "a.zip"]).is_err());
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("followback.toml");
        let mut file_config = Config::default();
        file_config.server.port = 4000;
        file_config.save_to_file(&config_path).unwrap();

        let cli = Cli::try_parse_from([
            "followback",
            "--config",
            config_path.to_str().unwrap(),
            "serve",
            "--port",
            "5000",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_config_rejects_bad_domain() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("followback.toml");
        Config::default().save_to_file(&config_path).unwrap();

        let cli = Cli::try_parse_from([
            "followback",
            "--config",
            config_path.to_str().unwrap(),
            "--domain",
            "not a domain",
            "check",
            "a.zip",
        ])
        .unwrap();

        assert!(cli.load_config().is_err());
    }
}
