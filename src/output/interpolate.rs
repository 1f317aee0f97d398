use std::io;

use serde::Deserialize;

use super::error::OutputError;

const REQUIRED_COLUMNS: [&str; 3] = ["timestamp", "latitude", "longitude"];

#[derive(Debug, Deserialize)]
struct TrackRecord {
    timestamp: f64,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub timestamp_s: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePosition {
    pub frame: usize,
    pub timestamp_s: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
}

fn is_usable(r: &TrackRecord) -> bool {
    r.latitude != 0.0
        && r.longitude != 0.0
        && r.latitude.abs() <= 90.0
        && r.longitude.abs() <= 180.0
        && r.timestamp.is_finite()
}

/// Read the location columns of a telemetry table, keeping only rows with
/// usable coordinates, ordered by timestamp.
pub fn read_track<R: io::Read>(reader: R) -> Result<Vec<TrackPoint>, OutputError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(OutputError::MissingColumn(column));
        }
    }

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for record in reader.deserialize::<TrackRecord>() {
        let record = record?;
        if !is_usable(&record) {
            skipped += 1;
            continue;
        }
        points.push(TrackPoint {
            timestamp_s: record.timestamp,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude_m: record.altitude.unwrap_or(0.0),
        });
    }
    if skipped > 0 {
        log::debug!("Skipped {} rows without a usable position", skipped);
    }

    points.sort_by(|a, b| a.timestamp_s.total_cmp(&b.timestamp_s));
    points.dedup_by(|b, a| a.timestamp_s == b.timestamp_s);
    log::info!("Loaded {} track points", points.len());
    Ok(points)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Linearly interpolate the track onto `frames` frame times `i / fps`,
/// extrapolating along the first and last segments outside the track.
pub fn interpolate_frames(
    points: &[TrackPoint],
    frames: usize,
    fps: f64,
) -> Result<Vec<FramePosition>, OutputError> {
    if !(fps > 0.0) {
        return Err(OutputError::InvalidArgument(format!(
            "frame rate must be positive, got {}",
            fps
        )));
    }
    let first = points.first().ok_or(OutputError::NoLocation)?;

    let positions = (0..frames)
        .map(|frame| {
            let t = frame as f64 / fps;
            if points.len() == 1 {
                return FramePosition {
                    frame,
                    timestamp_s: t,
                    latitude: first.latitude,
                    longitude: first.longitude,
                    altitude_m: first.altitude_m,
                };
            }
            let upper = points
                .partition_point(|p| p.timestamp_s <= t)
                .clamp(1, points.len() - 1);
            let (p0, p1) = (&points[upper - 1], &points[upper]);
            let f = (t - p0.timestamp_s) / (p1.timestamp_s - p0.timestamp_s);
            FramePosition {
                frame,
                timestamp_s: t,
                latitude: lerp(p0.latitude, p1.latitude, f),
                longitude: lerp(p0.longitude, p1.longitude, f),
                altitude_m: lerp(p0.altitude_m, p1.altitude_m, f),
            }
        })
        .collect::<Vec<_>>();

    log::info!("Interpolated {} track points onto {} frames", points.len(), frames);
    Ok(positions)
}

pub fn write_frames<W: io::Write>(frames: &[FramePosition], sink: W) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);
    writer.write_record(["frame", "timestamp", "latitude", "longitude", "altitude"])?;
    for f in frames {
        writer.write_record([
            f.frame.to_string(),
            format!("{:.6}", f.timestamp_s),
            format!("{:.7}", f.latitude),
            format!("{:.7}", f.longitude),
            format!("{:.3}", f.altitude_m),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
