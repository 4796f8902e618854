use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vdedup::{
    DetectionOptions, DetectionReport, DuplicateDetector, FfmpegLogLevel, OperationType,
    ProgressCallback, ProgressInfo, SignatureBuilder,
    execution::{self, ExecutionMode},
};

const CLI_AFTER_HELP: &str = "Examples:\n  vdedup scan ~/Videos\n  vdedup scan ~/Videos --json > report.json\n  vdedup --samples 12 --phash-thr 6 delete ~/Videos\n  vdedup move ~/Videos --to ~/Videos/.dupes --progress\n  vdedup signature clip.mp4 --json\n  vdedup completions zsh > _vdedup";

#[derive(Debug, Parser)]
#[command(
    name = "vdedup",
    version,
    about = "Find and remove near-duplicate videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
    /// Frames sampled per video.
    #[arg(long, global = true, default_value_t = vdedup::configuration::DEFAULT_SAMPLE_COUNT)]
    samples: usize,

    /// Maximum duration difference, in seconds, between duplicates.
    #[arg(long, global = true, default_value_t = vdedup::configuration::DEFAULT_DURATION_TOLERANCE)]
    duration_tol: f64,

    /// Maximum mean Hamming distance between duplicate frame hashes.
    #[arg(long, global = true, default_value_t = vdedup::configuration::DEFAULT_HASH_THRESHOLD)]
    phash_thr: f64,

    /// Check every file with ffprobe before signing it.
    #[arg(long, global = true)]
    validate: bool,

    /// Only scan the top level of the directory.
    #[arg(long, global = true)]
    top_level: bool,

    /// Worker thread count for signing.
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Path to the ffmpeg executable.
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Path to the ffprobe executable.
    #[arg(long, global = true, default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report near-duplicates without touching any file.
    #[command(
        about = "Report near-duplicate videos (dry run)",
        after_help = "Examples:\n  vdedup scan ~/Videos\n  vdedup scan ~/Videos --top-level --json"
    )]
    Scan {
        /// Directory to scan.
        directory: PathBuf,

        /// Output the report as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete every dropped duplicate.
    #[command(
        about = "Delete near-duplicate videos, keeping one per group",
        after_help = "Examples:\n  vdedup delete ~/Videos"
    )]
    Delete {
        /// Directory to scan.
        directory: PathBuf,
    },

    /// Move every dropped duplicate into a quarantine directory.
    #[command(
        about = "Move near-duplicate videos into a quarantine directory",
        after_help = "Examples:\n  vdedup move ~/Videos --to ~/Videos/.dupes"
    )]
    Move {
        /// Directory to scan.
        directory: PathBuf,

        /// Quarantine directory; created if missing.
        #[arg(long)]
        to: PathBuf,
    },

    /// Print the signature of a single video.
    #[command(
        about = "Print a video's signature",
        after_help = "Examples:\n  vdedup signature clip.mp4\n  vdedup signature clip.mp4 --json"
    )]
    Signature {
        /// Video file.
        input: PathBuf,

        /// Output the signature as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn init_logging(global: &GlobalOptions) {
    let env = env_logger::Env::default().default_filter_or(log_filter(global.verbose));
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed =
            FfmpegLogLevel::parse(level).ok_or(format!("unsupported --log-level: {level}"))?;
        vdedup::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn detection_options(
    global: &GlobalOptions,
) -> Result<DetectionOptions, Box<dyn std::error::Error>> {
    let mut options = DetectionOptions::new()
        .with_sample_count(global.samples)
        .with_duration_tolerance(global.duration_tol)
        .with_hash_threshold(global.phash_thr)
        .with_validation(global.validate)
        .with_ffmpeg_program(global.ffmpeg.clone())
        .with_ffprobe_program(global.ffprobe.clone())
        .with_threads(global.threads);

    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    options.validate()?;
    Ok(options)
}

fn detect(
    global: &GlobalOptions,
    directory: &Path,
) -> Result<DetectionReport, Box<dyn std::error::Error>> {
    if !directory.is_dir() {
        return Err(format!("directory not found: {}", directory.display()).into());
    }
    let detector = DuplicateDetector::new(detection_options(global)?)?;
    Ok(detector.find_duplicates_in(directory, !global.top_level)?)
}

fn carry_out(
    report: &DetectionReport,
    mode: &ExecutionMode,
    verb: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", execution::render_report(report));
    if report.decisions.is_empty() {
        return Ok(());
    }

    let summary = execution::execute(report, mode);
    for failure in &summary.failures {
        eprintln!("{} {}", "warning:".yellow().bold(), failure.to_string().yellow());
    }
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("{verb} {} file(s)", summary.processed.len()).green()
    );

    if summary.is_success() {
        Ok(())
    } else {
        Err(format!("{} file(s) could not be {verb}", summary.failures.len()).into())
    }
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>10} {bar:40.cyan/blue} {pos}/{len} {elapsed_precise}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::Validation => "validating",
            OperationType::Signing => "signing",
            _ => "working",
        };
        self.bar.set_message(label);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        if info.operation == OperationType::Signing && info.total == Some(info.current) {
            self.bar.finish_and_clear();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Scan { directory, json } => {
            let report = detect(&cli.global, &directory)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", execution::render_report(&report));
                if !report.decisions.is_empty() {
                    println!(
                        "{}",
                        "Dry run. Use `vdedup delete` or `vdedup move --to DIR` to act on it."
                            .yellow()
                    );
                }
            }
        }
        Commands::Delete { directory } => {
            let report = detect(&cli.global, &directory)?;
            carry_out(&report, &ExecutionMode::Delete, "deleted")?;
        }
        Commands::Move { directory, to } => {
            let report = detect(&cli.global, &directory)?;
            carry_out(&report, &ExecutionMode::Move { quarantine: to }, "moved")?;
        }
        Commands::Signature { input, json } => {
            let options = detection_options(&cli.global)?;
            let signature = SignatureBuilder::from_options(&options).build(&input)?;
            if json {
                let payload = json!({
                    "path": input,
                    "signature": signature,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "file".cyan().bold(), input.display());
                println!("Duration: {:.3}s", signature.duration());
                println!("Resolution: {}", signature.resolution());
                println!("Fidelity: {:?}", signature.fidelity());
                for (index, hash) in signature.hashes().iter().enumerate() {
                    println!("  [{index}] {hash}");
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vdedup", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
