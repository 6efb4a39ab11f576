use crate::error::{FollowbackError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub archive: ArchiveConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
    pub results_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    pub expected_extension: String,
    pub platform_domain: String,
    pub following_path: PathBuf,
    pub followers_path: PathBuf,
    pub max_upload_bytes: u64,
    pub max_unpacked_bytes: u64,
    /// Also read `followers_2.html`, `followers_3.html`, ... next to the
    /// followers document. Off by default: only the configured page counts.
    #[serde(default)]
    pub merge_follower_pages: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            expected_extension: "zip".to_string(),
            platform_domain: "instagram.com".to_string(),
            following_path: PathBuf::from("connections/followers_and_following/following.html"),
            followers_path: PathBuf::from("connections/followers_and_following/followers_1.html"),
            max_upload_bytes: 512 * 1024 * 1024,        // 512MB
            max_unpacked_bytes: 2 * 1024 * 1024 * 1024, // 2GB
            merge_follower_pages: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FollowbackError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FollowbackError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| FollowbackError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["followback.toml", ".followback.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref bind) = cli_args.bind {
            self.server.bind = bind.clone();
        }

        if let Some(port) = cli_args.port {
            self.server.port = port;
        }

        if let Some(ref uploads_dir) = cli_args.uploads_dir {
            self.storage.uploads_dir = uploads_dir.clone();
        }

        if let Some(ref results_dir) = cli_args.results_dir {
            self.storage.results_dir = results_dir.clone();
        }

        if let Some(ref domain) = cli_args.platform_domain {
            self.archive.platform_domain = domain.trim().to_lowercase();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| FollowbackError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| FollowbackError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.expected_extension.trim().is_empty() {
            return Err(FollowbackError::Config {
                message: "An archive extension must be specified".to_string(),
            });
        }

        validate_domain(&self.archive.platform_domain)?;
        validate_document_path("following_path", &self.archive.following_path)?;
        validate_document_path("followers_path", &self.archive.followers_path)?;

        if self.archive.max_upload_bytes == 0 {
            return Err(FollowbackError::Config {
                message: "Maximum upload size must be greater than 0".to_string(),
            });
        }

        if self.archive.max_unpacked_bytes < self.archive.max_upload_bytes {
            return Err(FollowbackError::Config {
                message: "Maximum unpacked size cannot be smaller than the maximum upload size"
                    .to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(FollowbackError::Config {
                message: "Server port must be greater than 0".to_string(),
            });
        }

        if self.storage.uploads_dir.as_os_str().is_empty()
            || self.storage.results_dir.as_os_str().is_empty()
        {
            return Err(FollowbackError::Config {
                message: "Uploads and results directories must be non-empty paths".to_string(),
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.bind, self.server.port)
            .parse()
            .map_err(|e| FollowbackError::Config {
                message: format!(
                    "Invalid bind address {}:{}: {}",
                    self.server.bind, self.server.port, e
                ),
            })
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

fn validate_domain(domain: &str) -> Result<()> {
    let invalid = || FollowbackError::Config {
        message: format!("Invalid platform domain: {:?}", domain),
    };

    if domain.is_empty() || domain.contains('/') || domain.starts_with("www.") {
        return Err(invalid());
    }

    let url = Url::parse(&format!("https://www.{}/", domain)).map_err(|_| invalid())?;
    match url.host_str() {
        Some(host) if host == format!("www.{}", domain) => Ok(()),
        _ => Err(invalid()),
    }
}

fn validate_document_path(field: &str, path: &Path) -> Result<()> {
    let is_relative_and_contained = !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if !is_relative_and_contained {
        return Err(FollowbackError::Config {
            message: format!(
                "{} must be a relative path inside the archive: {}",
                field,
                path.display()
            ),
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub uploads_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub platform_domain: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind(mut self, bind: Option<String>) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_uploads_dir(mut self, uploads_dir: Option<PathBuf>) -> Self {
        self.uploads_dir = uploads_dir;
        self
    }

    pub fn with_results_dir(mut self, results_dir: Option<PathBuf>) -> Self {
        self.results_dir = results_dir;
        self
    }

    pub fn with_platform_domain(mut self, domain: Option<String>) -> Self {
        self.platform_domain = domain;
        self
    }
}
