mod config;
mod job;
mod locator;
mod output;
mod report;
mod telemetry;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::Config;
use crate::job::{Job, JobOptions};
use crate::locator::{resolve_program, FfmpegDemuxer};
use crate::output::TrackClock;

#[derive(Parser)]
#[command(name = "telemetry-extract")]
#[command(about = "Extract action camera telemetry into a time series table")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract telemetry from one or more media files
    Extract {
        #[arg(required = true)]
        media: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Primary stream selector, e.g. 0:3
        #[arg(long)]
        stream: Option<String>,
        /// Alternate stream selectors, tried in order
        #[arg(long = "alt")]
        alternates: Vec<String>,
        /// Also write a GPX track
        #[arg(long)]
        gpx: bool,
        /// Recording start time (RFC 3339) for GPX timestamps
        #[arg(long)]
        start: Option<String>,
    },
    /// Decode a raw telemetry stream that was already extracted
    Decode {
        buffer: PathBuf,
        /// Output table, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the location channel as a GPX track
        #[arg(long)]
        gpx: Option<PathBuf>,
        /// Recording start time (RFC 3339) for GPX timestamps
        #[arg(long)]
        start: Option<String>,
    },
    /// Interpolate a telemetry table's location onto video frames
    Interpolate {
        table: PathBuf,
        /// Number of video frames
        #[arg(long)]
        frames: usize,
        /// Video frame rate, defaults to the configured frame rate
        #[arg(long)]
        fps: Option<f64>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Check that the demuxer can be run
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Extract {
            media,
            output_dir,
            stream,
            alternates,
            gpx,
            start,
        } => {
            let mut config = config;
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            if let Some(stream) = stream {
                config.streams.primary = stream;
            }
            if !alternates.is_empty() {
                config.streams.alternates = alternates;
            }
            config.output.gpx |= gpx;
            extract(&config, &media, start.as_deref())
        }
        Commands::Decode {
            buffer,
            output,
            gpx,
            start,
        } => decode(
            &config,
            &buffer,
            output.as_deref(),
            gpx.as_deref(),
            start.as_deref(),
        ),
        Commands::Interpolate {
            table,
            frames,
            fps,
            output,
        } => interpolate(
            &table,
            frames,
            fps.unwrap_or(config.output.frame_rate),
            &output,
        ),
        Commands::Check => check(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn parse_start(start: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    start
        .map(|s| {
            DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| format!("invalid start time {:?}: {}", s, e))
        })
        .transpose()
}

fn demuxer(config: &Config) -> Result<FfmpegDemuxer, String> {
    let timeout = config.demuxer.timeout().map_err(|e| e.to_string())?;
    let program = resolve_program(&config.demuxer.program).map_err(|e| e.to_string())?;
    Ok(FfmpegDemuxer::new(program, timeout))
}

fn extract(config: &Config, media: &[PathBuf], start: Option<&str>) -> ExitCode {
    let start = match parse_start(start) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let demuxer = match demuxer(config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Demuxer error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let job = Job::new(config, &demuxer, JobOptions { start });
    let mut failed = 0;
    for path in media {
        match job.run(path) {
            Ok(outcome) => {
                println!(
                    "{}: stream {}, {} rows ({})",
                    path.display(),
                    outcome.selected_stream,
                    outcome.rows,
                    outcome
                        .present
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                for output in &outcome.outputs {
                    println!("  {}", output.display());
                }
            }
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                eprintln!("{}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("{} of {} files failed", failed, media.len());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn decode(
    config: &Config,
    buffer: &Path,
    table_path: Option<&Path>,
    gpx: Option<&Path>,
    start: Option<&str>,
) -> ExitCode {
    let start = match parse_start(start) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let bytes = match fs::read(buffer) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let interval = config.frame_interval();
    let (table, _) = telemetry::process(&bytes, interval);
    drop(bytes);

    let written = match table_path {
        Some(path) => job::write_table_file(&table, path),
        None => output::write_table(&table, BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        eprintln!("Output error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Some(path) = gpx {
        let track: Vec<_> = table.rows.iter().filter_map(|r| r.location).collect();
        let name = buffer
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let clock = TrackClock {
            start,
            interval_s: interval,
        };
        if let Err(e) = job::write_gpx_file(&track, &name, clock, path) {
            eprintln!("Output error: {}", e);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn interpolate(table: &Path, frames: usize, fps: f64, frames_path: &Path) -> ExitCode {
    let result = fs::File::open(table)
        .map_err(output::OutputError::from)
        .and_then(output::read_track)
        .and_then(|points| output::interpolate_frames(&points, frames, fps))
        .and_then(|positions| {
            let file = fs::File::create(frames_path)?;
            output::write_frames(&positions, BufWriter::new(file))
        });

    match result {
        Ok(()) => {
            println!("Wrote {} frames to {}", frames, frames_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Interpolation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check(config: &Config) -> ExitCode {
    let demuxer = match demuxer(config) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Demuxer error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    match demuxer.version() {
        Ok(version) => {
            println!("Demuxer: {} ({})", demuxer.program().display(), version);
            println!("Stream candidates: {}", config.candidates().join(", "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Demuxer {} failed: {}", demuxer.program().display(), e);
            ExitCode::FAILURE
        }
    }
}
