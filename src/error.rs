//! Error types and handling for cardfit

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cardfit operations
pub type Result<T> = std::result::Result<T, CardFitError>;

/// Main error type for cardfit operations
#[derive(Debug, Error)]
pub enum CardFitError {
    /// I/O related errors
    #[error("I/O error: {source} (file: {file:?})")]
    IoError {
        #[source]
        source: std::io::Error,
        file: Option<PathBuf>,
    },

    /// Decode or encode failures from the image codecs
    #[error("Image processing error: {source} (file: {file:?})")]
    ImageError {
        #[source]
        source: image::ImageError,
        file: Option<PathBuf>,
    },

    /// JPEG encoding failures
    #[error("JPEG encoding error: {source} (file: {file:?})")]
    EncodeError {
        #[source]
        source: jpeg_encoder::EncodingError,
        file: Option<PathBuf>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// The input directory does not exist
    #[error("Input directory '{}' does not exist", path.display())]
    MissingDirectory { path: PathBuf },

    /// Invalid resize parameters
    #[error("Invalid resize parameters: {message}")]
    InvalidParameters { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerdeError(String),
}

impl CardFitError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new missing directory error
    pub fn missing_directory<P: Into<PathBuf>>(path: P) -> Self {
        Self::MissingDirectory { path: path.into() }
    }

    /// Create a new invalid parameters error
    pub fn invalid_parameters<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run rather than a single file
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::MissingDirectory { .. }
            | Self::ConfigError { .. }
            | Self::InvalidParameters { .. }
            | Self::SerdeError(_) => true,

            Self::IoError { .. } | Self::ImageError { .. } | Self::EncodeError { .. } => false,
        }
    }

    /// Get the associated file path if available
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::IoError { file, .. }
            | Self::ImageError { file, .. }
            | Self::EncodeError { file, .. } => file.as_ref(),
            Self::MissingDirectory { path } => Some(path),
            _ => None,
        }
    }

    /// Short message for the per-file report line, without the path
    pub fn user_message(&self) -> String {
        match self {
            Self::IoError { source, .. } => source.to_string(),
            Self::ImageError { source, .. } => source.to_string(),
            Self::EncodeError { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for CardFitError {
    fn from(source: std::io::Error) -> Self {
        Self::IoError { source, file: None }
    }
}

impl From<image::ImageError> for CardFitError {
    fn from(source: image::ImageError) -> Self {
        Self::ImageError { source, file: None }
    }
}

impl From<jpeg_encoder::EncodingError> for CardFitError {
    fn from(source: jpeg_encoder::EncodingError) -> Self {
        Self::EncodeError { source, file: None }
    }
}

impl From<toml::de::Error> for CardFitError {
    fn from(err: toml::de::Error) -> Self {
        Self::SerdeError(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for CardFitError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerdeError(format!("YAML parsing error: {}", err))
    }
}

/// Error context extension for adding file path information
pub trait ErrorContext<T> {
    /// Add file context to an error
    fn with_file_context(self, file: PathBuf) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<CardFitError>,
{
    fn with_file_context(self, file: PathBuf) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();

            match &mut error {
                CardFitError::IoError { file: ref mut f, .. }
                | CardFitError::ImageError { file: ref mut f, .. }
                | CardFitError::EncodeError { file: ref mut f, .. } => {
                    if f.is_none() {
                        *f = Some(file);
                    }
                }
                _ => {}
            }

            error
        })
    }
}
