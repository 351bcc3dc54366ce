//! cardfit CLI - rewrite every photo in `./imagenes` as a 390x260 menu card
//!
//! With no arguments the tool processes `imagenes` under the current
//! directory using the built-in card size, colour and quality.

use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use tracing::{debug, error};

use cardfit::{
    init, BatchProcessor, BatchReporter, CardFitError, Config, ConsoleReporter, SilentReporter,
};

/// cardfit - fit photos onto fixed-size menu cards, in place
#[derive(Parser)]
#[command(
    name = "cardfit",
    version,
    about = "Resize every image in a folder to fill a fixed card, in place",
    long_about = "cardfit scans a folder (default: ./imagenes) and rewrites every JPEG, PNG, GIF, \
                  BMP or WebP file as a 390x260 JPEG. Images keep their aspect ratio, are centred \
                  on a cream background and clipped to the card. File names are not changed."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Folder to process (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Configuration file (.toml or .yaml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of worker threads (1 = sequential)
    #[arg(short, long, value_name = "COUNT")]
    jobs: Option<usize>,

    /// List the files that would be rewritten without touching them
    #[arg(long)]
    dry_run: bool,

    /// Print the summary as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'Q', long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file holding the defaults
    ExampleConfig {
        /// Output file path
        #[arg(short, long, default_value = "cardfit.toml")]
        output: PathBuf,
        /// Use YAML format instead of TOML
        #[arg(long)]
        yaml: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(command) = &cli.command {
        if let Err(e) = handle_subcommand(command) {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
        return;
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", style("Error").red().bold(), e);
            process::exit(1);
        }
    };

    if let Err(e) = init(&config.logging) {
        eprintln!("{}: {}", style("Error").red().bold(), e);
        process::exit(1);
    }

    debug!("Effective configuration: {:?}", config);

    let processor = BatchProcessor::new(&config);

    let result = if cli.dry_run {
        run_dry(&processor)
    } else {
        run_batch(&processor, &cli)
    };

    if let Err(e) = result {
        report_fatal(&e, processor.input_dir());
        process::exit(1);
    }
}

/// Handle subcommands
fn handle_subcommand(command: &Commands) -> anyhow::Result<()> {
    match command {
        Commands::ExampleConfig { output, yaml } => generate_example_config(output, *yaml),
    }
}

/// Merge defaults, the optional config file and CLI flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.dir {
        config.input_dir = dir.clone();
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    if cli.quiet {
        config.logging.level = "error".to_string();
    } else if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn run_batch(processor: &BatchProcessor, cli: &Cli) -> cardfit::Result<()> {
    if cli.json {
        let summary = processor.run(&mut SilentReporter)?;
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
        return Ok(());
    }

    let mut reporter = ConsoleReporter::new().with_progress(!cli.quiet);
    processor.run(&mut reporter)?;
    Ok(())
}

fn run_dry(processor: &BatchProcessor) -> cardfit::Result<()> {
    let files = processor.scan()?;

    if files.is_empty() {
        ConsoleReporter::new().no_images(processor.input_dir());
        return Ok(());
    }

    println!("{} file(s) would be rewritten:", style(files.len()).bold());
    for file in &files {
        println!("  {}", file.display());
    }
    Ok(())
}

fn report_fatal(err: &CardFitError, input_dir: &Path) {
    match err {
        CardFitError::MissingDirectory { .. } => {
            eprintln!(
                "{} The folder '{}' does not exist.",
                style("❌").red(),
                input_dir.display()
            );
            eprintln!("   Create the folder and put your images in it.");
        }
        other => eprintln!("{}: {}", style("Error").red().bold(), other),
    }
}

/// Generate example configuration file
fn generate_example_config(output: &Path, use_yaml: bool) -> anyhow::Result<()> {
    let mut path = output.to_path_buf();
    if use_yaml && path.extension().map_or(true, |ext| ext == "toml") {
        path.set_extension("yaml");
    }

    Config::default()
        .to_file(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let format = if use_yaml { "YAML" } else { "TOML" };
    println!(
        "{}: Generated example {} configuration: {}",
        style("Success").green().bold(),
        format,
        path.display()
    );

    Ok(())
}
