//! Core image processing functionality

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Config, TargetBox};
use crate::error::{ErrorContext, Result};

pub mod formats;
pub mod resize;

pub use formats::*;
pub use resize::*;

/// Rewrites single image files in place onto the target canvas
#[derive(Debug, Clone)]
pub struct ProcessingEngine {
    fitter: CanvasFitter,
    quality: u8,
}

impl ProcessingEngine {
    /// Create a processing engine for the given configuration
    pub fn new(config: &Config) -> Self {
        Self {
            fitter: CanvasFitter::from_config(config),
            quality: config.quality,
        }
    }

    pub fn target(&self) -> TargetBox {
        self.fitter.target()
    }

    /// Decode, fit and re-encode `path` as JPEG, overwriting it.
    ///
    /// The file name is left alone even when its extension names another
    /// format. The new bytes are fully encoded before the file is opened for
    /// writing, so decode and encode failures leave the original intact.
    pub fn process_file<P: AsRef<Path>>(&self, path: P) -> Result<ProcessingResult> {
        let start_time = Instant::now();
        let (image, original) = self.load(path.as_ref())?;
        self.rewrite(&image, original, start_time)
    }

    /// Read and decode `path` without modifying it
    pub fn load(&self, path: &Path) -> Result<(DynamicImage, ImageInfo)> {
        debug!("Processing file: {:?}", path);

        let data = fs::read(path).with_file_context(path.to_path_buf())?;
        let image = image::load_from_memory(&data).with_file_context(path.to_path_buf())?;

        let original = ImageInfo {
            path: path.to_path_buf(),
            width: image.width(),
            height: image.height(),
            file_size: data.len() as u64,
            format: detect_format_from_header(&data),
        };

        debug!("Loaded image: {}x{} ({:?})", original.width, original.height, original.format);
        Ok((image, original))
    }

    fn rewrite(&self, image: &DynamicImage, original: ImageInfo, start_time: Instant) -> Result<ProcessingResult> {
        let path = original.path.clone();

        let (canvas, plan) = self.fitter.fit(image)?;
        let encoded = encode_jpeg(&canvas, self.quality).with_file_context(path.clone())?;

        fs::write(&path, &encoded).with_file_context(path.clone())?;

        if let Some(format) = detect_format_from_path(&path).filter(|f| *f != ImageFormat::Jpeg) {
            warn!(
                "{:?} keeps its .{} name but now contains JPEG data",
                path,
                format.extension()
            );
        }

        let file_size = fs::metadata(&path).with_file_context(path.clone())?.len();

        let output = ImageInfo {
            path: path.clone(),
            width: canvas.width(),
            height: canvas.height(),
            file_size,
            format: Some(ImageFormat::Jpeg),
        };

        debug!("Saved image: {}x{} ({} bytes)", output.width, output.height, output.file_size);

        Ok(ProcessingResult {
            path,
            original,
            output,
            plan,
            processing_time: start_time.elapsed(),
        })
    }

    /// Process one file, turning any failure into a reportable outcome.
    ///
    /// Source dimensions are kept whenever decoding got that far, even if
    /// fitting or writing failed afterwards.
    pub fn process_outcome<P: AsRef<Path>>(&self, path: P) -> FileOutcome {
        let start_time = Instant::now();
        let path = path.as_ref();
        let mut original_dimensions = None;

        let result = self
            .load(path)
            .and_then(|(image, original)| {
                original_dimensions = Some((original.width, original.height));
                self.rewrite(&image, original, start_time)
            })
            .map_err(|e| {
                warn!("Failed to process {:?}: {}", path, e);
                e.user_message()
            });

        FileOutcome {
            path: path.to_path_buf(),
            original_dimensions,
            result,
        }
    }
}

impl Default for ProcessingEngine {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Information about an image file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    /// Format sniffed from the file contents
    pub format: Option<ImageFormat>,
}

impl ImageInfo {
    pub fn size_kb(&self) -> f64 {
        self.file_size as f64 / 1024.0
    }
}

/// Result of rewriting one image
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub path: PathBuf,
    pub original: ImageInfo,
    pub output: ImageInfo,
    pub plan: FitPlan,
    pub processing_time: Duration,
}

/// Success or failure-with-reason for one scanned file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Source size, known once the file decoded
    pub original_dimensions: Option<(u32, u32)>,
    pub result: std::result::Result<ProcessingResult, String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// File name for report lines
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }

    #[test]
    fn test_process_png_rewrites_as_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "wide.png", 1000, 500);
        let engine = ProcessingEngine::default();

        let result = engine.process_file(&path).unwrap();

        assert_eq!((result.original.width, result.original.height), (1000, 500));
        assert_eq!(result.original.format, Some(ImageFormat::Png));
        assert_eq!((result.output.width, result.output.height), (390, 260));
        assert_eq!(result.plan.offset_x, -65);

        let bytes = fs::read(&path).unwrap();
        assert_eq!(detect_format_from_header(&bytes), Some(ImageFormat::Jpeg));
        assert_eq!(result.output.file_size, bytes.len() as u64);

        let reloaded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (390, 260));
    }

    #[test]
    fn test_reprocessing_keeps_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "tall.png", 300, 700);
        let engine = ProcessingEngine::default();

        engine.process_file(&path).unwrap();
        let second = engine.process_file(&path).unwrap();

        assert_eq!((second.original.width, second.original.height), (390, 260));
        assert!(second.plan.is_exact(engine.target()));
        assert_eq!((second.output.width, second.output.height), (390, 260));
    }

    #[test]
    fn test_rgba_source_is_flattened() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logo.png");
        ImageBuffer::from_pixel(600, 400, Rgba([20u8, 40, 60, 128]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let result = ProcessingEngine::default().process_file(&path).unwrap();
        assert_eq!((result.output.width, result.output.height), (390, 260));
    }

    #[test]
    fn test_corrupt_file_is_left_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let outcome = ProcessingEngine::default().process_outcome(&path);

        assert!(!outcome.is_success());
        assert_eq!(outcome.file_name(), "broken.jpg");
        assert_eq!(outcome.original_dimensions, None);
        assert!(!outcome.result.unwrap_err().is_empty());
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a jpeg");
    }

    #[test]
    fn test_encode_failure_keeps_original_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "banner.png", 10, 10);
        let before = fs::read(&path).unwrap();
        let config = Config {
            target: TargetBox::new(70_000, 1),
            ..Config::default()
        };

        let outcome = ProcessingEngine::new(&config).process_outcome(&path);

        assert!(!outcome.is_success());
        assert_eq!(outcome.original_dimensions, Some((10, 10)));
        assert!(outcome.result.unwrap_err().contains("JPEG limit"));
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_successful_outcome_records_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "wide.png", 800, 300);

        let outcome = ProcessingEngine::default().process_outcome(&path);

        assert!(outcome.is_success());
        assert_eq!(outcome.original_dimensions, Some((800, 300)));
    }

    #[test]
    fn test_missing_file_reports_error() {
        let dir = TempDir::new().unwrap();
        let err = ProcessingEngine::default()
            .process_file(dir.path().join("gone.png"))
            .unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.file_path(), Some(&dir.path().join("gone.png")));
    }

    #[test]
    fn test_custom_target() {
        let dir = TempDir::new().unwrap();
        let path = write_png(dir.path(), "square.png", 500, 500);
        let config = Config {
            target: TargetBox::new(100, 50),
            ..Config::default()
        };

        let result = ProcessingEngine::new(&config).process_file(&path).unwrap();
        assert_eq!((result.output.width, result.output.height), (100, 50));
        assert_eq!((result.plan.new_width, result.plan.new_height), (100, 100));
    }
}
