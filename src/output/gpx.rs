use std::io::{self, Write};

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::telemetry::LocationSample;

/// Clock used to stamp track points. Without a start instant the points are
/// written without `<time>` elements.
#[derive(Debug, Clone, Copy)]
pub struct TrackClock {
    pub start: Option<DateTime<Utc>>,
    pub interval_s: f64,
}

impl TrackClock {
    fn at(&self, index: usize) -> Option<DateTime<Utc>> {
        let offset_ms = (index as f64 * self.interval_s * 1000.0).round() as i64;
        self.start.map(|start| start + Duration::milliseconds(offset_ms))
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write the location channel as a single-segment GPX 1.1 track.
pub fn write_gpx<W: Write>(
    samples: &[LocationSample],
    name: &str,
    clock: TrackClock,
    mut sink: W,
) -> io::Result<()> {
    writeln!(sink, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        sink,
        r#"<gpx version="1.1" creator="telemetry-extract" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;
    writeln!(sink, "  <trk>")?;
    writeln!(sink, "    <name>{}</name>", escape(name))?;
    writeln!(sink, "    <trkseg>")?;
    for (i, s) in samples.iter().enumerate() {
        write!(
            sink,
            r#"      <trkpt lat="{:.7}" lon="{:.7}"><ele>{:.3}</ele>"#,
            s.latitude, s.longitude, s.altitude_m
        )?;
        if let Some(time) = clock.at(i) {
            write!(
                sink,
                "<time>{}</time>",
                time.to_rfc3339_opts(SecondsFormat::Millis, true)
            )?;
        }
        writeln!(sink, "</trkpt>")?;
    }
    writeln!(sink, "    </trkseg>")?;
    writeln!(sink, "  </trk>")?;
    writeln!(sink, "</gpx>")?;
    sink.flush()
}
