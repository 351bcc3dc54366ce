//! Configuration management for cardfit

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{CardFitError, Result};
use crate::processing::MAX_JPEG_DIMENSION;

/// Directory scanned when nothing else is configured
pub const DEFAULT_INPUT_DIR: &str = "imagenes";

/// Card size used by the menu site
pub const TARGET_WIDTH: u32 = 390;
pub const TARGET_HEIGHT: u32 = 260;

/// Cream background of the menu cards
pub const BACKGROUND_COLOR: [u8; 3] = [245, 237, 224];

/// JPEG quality for rewritten files
pub const DEFAULT_QUALITY: u8 = 85;

/// Extensions picked up by the scanner (compared case-insensitively)
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory whose images are rewritten in place
    pub input_dir: PathBuf,

    /// JPEG quality (1-100)
    pub quality: u8,

    /// Number of worker threads (1 = sequential)
    pub jobs: usize,

    /// Resampling filter
    pub filter: FilterType,

    /// Fill colour for the letterbox area
    pub background: Background,

    /// Recognised file extensions, without the dot
    pub extensions: Vec<String>,

    /// Output canvas every image is fitted onto
    pub target: TargetBox,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            quality: DEFAULT_QUALITY,
            jobs: 1,
            filter: FilterType::default(),
            background: Background::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            target: TargetBox::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Fixed output canvas size
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetBox {
    pub width: u32,
    pub height: u32,
}

impl TargetBox {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl Default for TargetBox {
    fn default() -> Self {
        Self::new(TARGET_WIDTH, TARGET_HEIGHT)
    }
}

impl std::fmt::Display for TargetBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opaque RGB background colour
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Background(pub [u8; 3]);

impl Default for Background {
    fn default() -> Self {
        Self(BACKGROUND_COLOR)
    }
}

impl From<Background> for image::Rgb<u8> {
    fn from(color: Background) -> Self {
        image::Rgb(color.0)
    }
}

/// Resampling filters usable for the fit step
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor; aliases when shrinking and is rejected by validation
    Nearest,
    /// Linear interpolation
    Triangle,
    /// Catmull-Rom cubic spline
    CatmullRom,
    /// Gaussian
    Gaussian,
    /// Lanczos with radius 3
    #[default]
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Gaussian => image::imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a `.toml` or `.yaml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CardFitError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        match config_extension(path.as_ref()).as_str() {
            "toml" => toml::from_str(&content).map_err(Into::into),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(Into::into),
            _ => Err(CardFitError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        }
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match config_extension(path.as_ref()).as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| CardFitError::config(format!("TOML serialization failed: {}", e)))?,
            "yaml" | "yml" => serde_yaml::to_string(self)
                .map_err(|e| CardFitError::config(format!("YAML serialization failed: {}", e)))?,
            _ => return Err(CardFitError::config(
                "Unsupported config file format. Use .toml or .yaml"
            )),
        };

        std::fs::write(&path, content)
            .map_err(|e| CardFitError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.target.width == 0 || self.target.height == 0 {
            return Err(CardFitError::config(format!(
                "Target box must be non-empty, got {}", self.target
            )));
        }

        if self.target.width > MAX_JPEG_DIMENSION || self.target.height > MAX_JPEG_DIMENSION {
            return Err(CardFitError::config(format!(
                "Target box {} exceeds the JPEG limit of {} pixels per side",
                self.target, MAX_JPEG_DIMENSION
            )));
        }

        if !(1..=100).contains(&self.quality) {
            return Err(CardFitError::config(format!(
                "Quality must be between 1 and 100, got {}", self.quality
            )));
        }

        if self.extensions.is_empty() {
            return Err(CardFitError::config("At least one image extension is required"));
        }

        if self.filter == FilterType::Nearest {
            return Err(CardFitError::config(
                "Nearest-neighbor resampling is not allowed; use lanczos3, catmullrom, gaussian or triangle"
            ));
        }

        if self.jobs == 0 {
            return Err(CardFitError::config("Job count must be greater than 0"));
        }

        Ok(())
    }

    /// Whether a file extension (without the dot) is one the scanner picks up
    pub fn is_recognized_extension(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}

fn config_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}
