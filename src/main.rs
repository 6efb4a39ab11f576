use clap::Parser;
use followback::{
    server, Cli, Command, Followback, FollowbackError, OutputFormatter, OutputMode, ScanOutcome,
    UserFriendlyError,
};
use std::process;
use tracing_subscriber::EnvFilter;

const EXIT_ALL_FOLLOW_BACK: i32 = 0;
const EXIT_NOT_FOLLOWING_BACK: i32 = 10;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    setup_logging(cli.verbosity_level(), cli.quiet);

    match cli.command {
        Some(Command::Serve { .. }) => handle_serve(&cli).await,
        Some(Command::Check {
            ref archive,
            output_format,
        }) => {
            let app = match Followback::from_cli(&cli, output_format) {
                Ok(app) => app,
                Err(e) => {
                    print_startup_error(&e);
                    return exit_code_for_error(&e);
                }
            };

            match app.check_archive(archive).await {
                Ok(outcome) => exit_code_for_outcome(&outcome),
                Err(e) => {
                    app.handle_error(&e);
                    exit_code_for_error(&e)
                }
            }
        }
        None => {
            eprintln!("No command given. Run `followback --help` for usage.");
            2
        }
    }
}

async fn handle_serve(cli: &Cli) -> i32 {
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for_error(&e);
        }
    };

    match server::serve(&config).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            print_startup_error(&e);
            exit_code_for_error(&e)
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "followback.toml".to_string());

    match Followback::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  followback --config {} serve", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn exit_code_for_outcome(outcome: &ScanOutcome) -> i32 {
    if outcome.everyone_follows_back() {
        EXIT_ALL_FOLLOW_BACK
    } else {
        EXIT_NOT_FOLLOWING_BACK
    }
}

fn exit_code_for_error(error: &FollowbackError) -> i32 {
    match error {
        FollowbackError::Cancelled => 130, // Interrupted (SIGINT)
        FollowbackError::InvalidInput { .. } => 2,
        FollowbackError::Extraction { .. } | FollowbackError::UnsafeEntryPath { .. } => 3,
        FollowbackError::MissingData { .. } => 4,
        FollowbackError::Persistence { .. } => 5,
        _ => 1,
    }
}

fn print_startup_error(error: &FollowbackError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

/// `RUST_LOG` wins when set; otherwise verbosity picks the level.
fn setup_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let default_filter = format!("followback={level},tower_http={level}");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use followback::Config;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "followback",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[archive]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_exit_codes_for_errors() {
        assert_eq!(exit_code_for_error(&FollowbackError::Cancelled), 130);
        assert_eq!(
            exit_code_for_error(&FollowbackError::InvalidInput {
                reason: "x".to_string()
            }),
            2
        );
        assert_eq!(
            exit_code_for_error(&FollowbackError::UnsafeEntryPath {
                entry: "../x".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for_error(&FollowbackError::MissingData {
                path: "following.html".to_string()
            }),
            4
        );
        assert_eq!(
            exit_code_for_error(&FollowbackError::Config {
                message: "bad".to_string()
            }),
            1
        );
    }
}
