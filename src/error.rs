use thiserror::Error;

#[derive(Error, Debug)]
pub enum FollowbackError {
    #[error("Invalid upload: {reason}")]
    InvalidInput { reason: String },

    #[error("Archive extraction failed: {message}")]
    Extraction { message: String },

    #[error("Archive entry escapes the extraction root: {entry}")]
    UnsafeEntryPath { entry: String },

    #[error("Expected export document not found: {path}")]
    MissingData { path: String },

    #[error("Could not write result file {path}: {source}")]
    Persistence {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Server error: {message}")]
    Server { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl FollowbackError {
    /// True for the failures the unpacker reports, including rejected entry paths.
    pub fn is_extraction(&self) -> bool {
        matches!(
            self,
            FollowbackError::Extraction { .. } | FollowbackError::UnsafeEntryPath { .. }
        )
    }

    /// HTTP status the upload endpoint answers with for this failure.
    pub fn http_status(&self) -> u16 {
        match self {
            FollowbackError::InvalidInput { .. } => 400,
            _ => 500,
        }
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for FollowbackError {
    fn user_message(&self) -> String {
        match self {
            FollowbackError::InvalidInput { reason } => {
                format!("The uploaded file was rejected: {}", reason)
            }
            FollowbackError::Extraction { message } => {
                format!("Could not unpack the archive: {}", message)
            }
            FollowbackError::UnsafeEntryPath { entry } => {
                format!("The archive contains an unsafe entry path: {}", entry)
            }
            FollowbackError::MissingData { path } => {
                format!("The archive does not contain {}", path)
            }
            FollowbackError::Persistence { path, .. } => {
                format!("Could not save the result list to {}", path)
            }
            FollowbackError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            FollowbackError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            FollowbackError::InvalidInput { .. } => Some(
                "Upload the .zip file exactly as the platform delivered it; other formats are not supported.".to_string()
            ),
            FollowbackError::Extraction { .. } | FollowbackError::UnsafeEntryPath { .. } => Some(
                "Download the export again; the file looks damaged or was not produced by the platform.".to_string()
            ),
            FollowbackError::MissingData { .. } => Some(
                "Request the export in HTML format and make sure \"Followers and following\" is included.".to_string()
            ),
            FollowbackError::Persistence { .. } => Some(
                "Check that the results directory exists and is writable.".to_string()
            ),
            FollowbackError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for FollowbackError {
    fn from(error: zip::result::ZipError) -> Self {
        FollowbackError::Extraction {
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for FollowbackError {
    fn from(error: toml::de::Error) -> Self {
        FollowbackError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FollowbackError>;
