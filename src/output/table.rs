use std::io;

use crate::telemetry::{Channel, TelemetryRow, TelemetryTable};

use super::error::OutputError;

const INDEX_COLUMNS: [&str; 2] = ["index", "timestamp"];

fn columns(channel: Channel) -> &'static [&'static str] {
    match channel {
        Channel::Location => &["latitude", "longitude", "altitude", "speed_2d", "speed_3d"],
        Channel::Accel => &["accel_x", "accel_y", "accel_z"],
        Channel::Gyro => &["gyro_x", "gyro_y", "gyro_z"],
        Channel::Orientation => &["quat_w", "quat_x", "quat_y", "quat_z"],
    }
}

fn header(present: &[Channel]) -> Vec<&'static str> {
    INDEX_COLUMNS
        .iter()
        .copied()
        .chain(present.iter().flat_map(|c| columns(*c).iter().copied()))
        .collect()
}

// Missing samples render as zero, or the identity quaternion for orientation.
fn render_channel(row: &TelemetryRow, channel: Channel, out: &mut Vec<String>) {
    match channel {
        Channel::Location => {
            let l = row.location.unwrap_or_default();
            out.push(format!("{:.7}", l.latitude));
            out.push(format!("{:.7}", l.longitude));
            out.push(format!("{:.3}", l.altitude_m));
            out.push(format!("{:.3}", l.speed_2d_m_s));
            out.push(format!("{:.3}", l.speed_3d_m_s));
        }
        Channel::Accel | Channel::Gyro => {
            let m = if channel == Channel::Accel {
                row.accel
            } else {
                row.gyro
            }
            .unwrap_or_default();
            out.extend([m.x, m.y, m.z].iter().map(|v| format!("{:.6}", v)));
        }
        Channel::Orientation => {
            let q = row.orientation.unwrap_or_default();
            out.extend([q.w, q.x, q.y, q.z].iter().map(|v| format!("{:.6}", v)));
        }
    }
}

fn render_row(row: &TelemetryRow, present: &[Channel]) -> Vec<String> {
    let mut out = vec![row.index.to_string(), format!("{:.6}", row.timestamp_s)];
    for channel in present {
        render_channel(row, *channel, &mut out);
    }
    out
}

/// Write the aligned table as comma separated text, one header row and one
/// line per row.
pub fn write_table<W: io::Write>(table: &TelemetryTable, sink: W) -> Result<(), OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(sink);

    writer.write_record(header(&table.present))?;
    for row in &table.rows {
        writer.write_record(render_row(row, &table.present))?;
    }
    writer.flush()?;
    Ok(())
}
