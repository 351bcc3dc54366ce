//! cardfit - fit a folder of photos onto fixed-size menu cards
//!
//! Every recognised image in the input directory is scaled to cover a
//! 390x260 card while keeping its aspect ratio, centred on a cream
//! background, clipped to the card, and written back in place as JPEG.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cardfit::{BatchProcessor, Config, ConsoleReporter};
//!
//! let config = Config::default();
//! let summary = BatchProcessor::new(&config).run(&mut ConsoleReporter::new())?;
//! println!("{}/{} resized", summary.successful, summary.total);
//! # Ok::<(), cardfit::CardFitError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod processing;

// Re-export commonly used types
pub use batch::{BatchProcessor, BatchReporter, BatchSummary, ConsoleReporter, SilentReporter};
pub use config::{Background, Config, FilterType, LoggingConfig, TargetBox};
pub use error::{CardFitError, Result};
pub use processing::{calculate_fit, CanvasFitter, FileOutcome, FitPlan, ProcessingEngine};

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Logs go to stderr
/// so the report on stdout stays readable. Calling this more than once is
/// harmless; only the first subscriber is kept.
pub fn init(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| CardFitError::config(format!("Invalid log level '{}': {}", logging.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if logging.json_format {
        tracing::subscriber::set_global_default(builder.json().finish()).is_ok()
    } else {
        tracing::subscriber::set_global_default(builder.finish()).is_ok()
    };

    if installed {
        debug!("cardfit v{} initialized", VERSION);
    }

    Ok(())
}
