use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::Config;
use crate::locator::{Demuxer, LocateError, StreamLocator};
use crate::output::{write_gpx, write_table, OutputError, TrackClock};
use crate::report::{JobReport, JobState};
use crate::telemetry::{self, Channel, DecodeStats, LocationSample, TelemetryTable};

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error("output error: {0}")]
    Output(#[from] OutputError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-job options on top of the shared configuration.
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    /// Wall-clock instant of the first row, used to stamp GPX points.
    pub start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub table: PathBuf,
    pub gpx: PathBuf,
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn for_media(dir: &Path, media: &Path) -> Self {
        let stem = media
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "telemetry".to_string());
        Self {
            table: dir.join(format!("{}_telemetry.csv", stem)),
            gpx: dir.join(format!("{}_track.gpx", stem)),
            report: dir.join(format!("{}_report.yaml", stem)),
        }
    }
}

#[derive(Debug)]
pub struct JobOutcome {
    pub selected_stream: String,
    pub rows: usize,
    pub present: Vec<Channel>,
    pub outputs: Vec<PathBuf>,
}

/// Converts one media file into a telemetry table.
pub struct Job<'a, D: Demuxer> {
    config: &'a Config,
    demuxer: &'a D,
    options: JobOptions,
}

impl<'a, D: Demuxer> Job<'a, D> {
    pub fn new(config: &'a Config, demuxer: &'a D, options: JobOptions) -> Self {
        Self {
            config,
            demuxer,
            options,
        }
    }

    pub fn run(&self, media: &Path) -> Result<JobOutcome, JobError> {
        let paths = OutputPaths::for_media(&self.config.output.directory, media);
        let mut report = JobReport::new(media);

        let result = self.convert(media, &paths, &mut report);
        match &result {
            Ok(_) => report.finish_with_state(JobState::Completed),
            Err(JobError::Locate(LocateError::StreamNotFound { attempts, .. })) => {
                report.attempts = attempts.clone();
                report.error = result.as_ref().err().map(|e| e.to_string());
                report.finish_with_state(JobState::StreamNotFound);
            }
            Err(e) => {
                report.error = Some(e.to_string());
                report.finish_with_state(JobState::Failed);
            }
        }

        if self.config.output.report {
            if let Err(e) = fs::create_dir_all(&self.config.output.directory)
                .and_then(|_| report.save(&paths.report))
            {
                log::warn!("Failed to write report {}: {}", paths.report.display(), e);
            } else {
                log::info!("Report written to {}", paths.report.display());
            }
        }
        result
    }

    fn convert(
        &self,
        media: &Path,
        paths: &OutputPaths,
        report: &mut JobReport,
    ) -> Result<JobOutcome, JobError> {
        log::info!("Processing {}", media.display());

        let locator = StreamLocator::new(
            self.demuxer,
            self.config.demuxer.scratch_dir.clone(),
            self.config.demuxer.min_size_bytes,
        );
        let located = locator.locate(media, &self.config.candidates())?;
        report.attempts = located.attempts.clone();
        report.selected_stream = Some(located.selector.clone());
        report.buffer_bytes = Some(located.buffer.len());
        log::info!(
            "Using stream {} ({} bytes)",
            located.selector,
            located.buffer.len()
        );

        let interval = self.config.frame_interval();
        let (table, stats) = telemetry::process(located.buffer.as_bytes(), interval);
        drop(located.buffer);
        report.channels = Some(stats.clone());
        report.rows = Some(table.rows.len());

        fs::create_dir_all(&self.config.output.directory)?;
        let mut outputs = Vec::new();
        write_table_file(&table, &paths.table)?;
        report.outputs.push(paths.table.clone());
        outputs.push(paths.table.clone());

        if self.config.output.gpx {
            let name = media
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let clock = TrackClock {
                start: self.options.start,
                interval_s: interval,
            };
            if write_gpx_file(&location_track(&table), &name, clock, &paths.gpx)? {
                report.outputs.push(paths.gpx.clone());
                outputs.push(paths.gpx.clone());
            }
        }

        log_summary(&stats, &table);
        Ok(JobOutcome {
            selected_stream: located.selector,
            rows: table.rows.len(),
            present: table.present,
            outputs,
        })
    }
}

fn location_track(table: &TelemetryTable) -> Vec<LocationSample> {
    table.rows.iter().filter_map(|r| r.location).collect()
}

pub fn write_table_file(table: &TelemetryTable, path: &Path) -> Result<(), OutputError> {
    let file = fs::File::create(path)?;
    write_table(table, BufWriter::new(file))?;
    log::info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

/// Returns `false` when there is no location data to write.
pub fn write_gpx_file(
    track: &[LocationSample],
    name: &str,
    clock: TrackClock,
    path: &Path,
) -> Result<bool, OutputError> {
    if track.is_empty() {
        log::warn!("No location samples, skipping GPX export");
        return Ok(false);
    }
    let file = fs::File::create(path)?;
    write_gpx(track, name, clock, BufWriter::new(file))?;
    log::info!("Wrote {} track points to {}", track.len(), path.display());
    Ok(true)
}

fn log_summary(stats: &DecodeStats, table: &TelemetryTable) {
    let truncated = stats.location.truncated_blocks
        + stats.accel.truncated_blocks
        + stats.gyro.truncated_blocks
        + stats.orientation.truncated_blocks;
    if truncated > 0 {
        log::debug!("{} blocks ended at the end of the buffer", truncated);
    }
    if table.present.is_empty() {
        log::warn!("No telemetry samples decoded; wrote a placeholder row");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::FakeDemuxer;
    use crate::telemetry::fixtures::{block, i16_record, location_record};

    fn config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.join("out");
        config.demuxer.scratch_dir = dir.join("scratch");
        config.demuxer.min_size_bytes = 64;
        config
    }

    fn telemetry_buffer() -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf.extend(block(
            b"GPS5",
            8,
            &[
                location_record(356_812_345, 1_397_654_321, 40_250, 1_500, 1_750),
                location_record(356_812_400, 1_397_654_400, 40_300, 1_600, 1_800),
            ],
        ));
        buf.extend(vec![0u8; 16]);
        buf.extend(block(b"GYRO", 12, &[i16_record(&[10, 20, 30])]));
        buf
    }

    #[test]
    fn converts_media_and_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.gpx = true;
        let demuxer = FakeDemuxer::default()
            .with("0:3", Some(vec![1u8; 8]))
            .with("0:2", Some(telemetry_buffer()));

        let outcome = Job::new(&config, &demuxer, JobOptions::default())
            .run(Path::new("GS010692.360"))
            .unwrap();

        assert_eq!(outcome.selected_stream, "0:2");
        assert_eq!(outcome.present, vec![Channel::Location, Channel::Gyro]);
        assert!(outcome.rows >= 2);

        let paths = OutputPaths::for_media(&config.output.directory, Path::new("GS010692.360"));
        let table = fs::read_to_string(&paths.table).unwrap();
        let mut lines = table.lines();
        assert_eq!(
            lines.next(),
            Some(
                "index,timestamp,latitude,longitude,altitude,speed_2d,speed_3d,\
                 gyro_x,gyro_y,gyro_z"
            )
        );
        assert!(lines
            .next()
            .unwrap()
            .starts_with("0,0.000000,35.6812345,139.7654321,40.250,1.500,1.750,"));

        let gpx = fs::read_to_string(&paths.gpx).unwrap();
        assert_eq!(gpx.matches("<trkpt").count(), 2);

        let report: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&paths.report).unwrap()).unwrap();
        assert_eq!(report["state"].as_str(), Some("completed"));
        assert_eq!(report["selected_stream"].as_str(), Some("0:2"));
        assert_eq!(report["channels"]["location"]["samples"].as_u64(), Some(2));
        assert_eq!(report["channels"]["accel"]["empty"].as_bool(), Some(true));
        assert_eq!(report["channels"]["gyro"]["empty"].as_bool(), Some(false));

        assert_eq!(fs::read_dir(dir.path().join("scratch")).unwrap().count(), 0);
    }

    #[test]
    fn stream_not_found_is_reported_and_returned() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let demuxer = FakeDemuxer::default();

        let err = Job::new(&config, &demuxer, JobOptions::default())
            .run(Path::new("broken.mp4"))
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Locate(LocateError::StreamNotFound { .. })
        ));

        let paths = OutputPaths::for_media(&config.output.directory, Path::new("broken.mp4"));
        assert!(!paths.table.exists());
        let report: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&paths.report).unwrap()).unwrap();
        assert_eq!(report["state"].as_str(), Some("stream_not_found"));
        assert_eq!(report["attempts"].as_sequence().map(|s| s.len()), Some(4));
        assert_eq!(fs::read_dir(dir.path().join("scratch")).unwrap().count(), 0);
    }

    #[test]
    fn markerless_stream_gives_placeholder_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.output.report = false;
        config.output.gpx = true;
        let demuxer = FakeDemuxer::default().with("0:3", Some(vec![0x11u8; 128]));

        let outcome = Job::new(&config, &demuxer, JobOptions::default())
            .run(Path::new("empty.mp4"))
            .unwrap();

        assert_eq!(outcome.rows, 1);
        assert_eq!(outcome.outputs.len(), 1);
        let paths = OutputPaths::for_media(&config.output.directory, Path::new("empty.mp4"));
        assert_eq!(
            fs::read_to_string(&paths.table).unwrap(),
            "index,timestamp\n0,0.000000\n"
        );
        assert!(!paths.gpx.exists());
        assert!(!paths.report.exists());
    }
}
