mod aggregate;
mod decode;
mod layout;
mod scanner;
mod types;

pub use aggregate::{TelemetryRow, TelemetryTable, DEFAULT_FRAME_RATE};
pub use types::{Channel, DecodeStats, LocationSample};

pub(crate) use aggregate::align;
use decode::decode_all;

#[cfg(test)]
pub(crate) use decode::tests as fixtures;
#[cfg(test)]
pub(crate) use types::{ChannelSet, MotionSample};

/// Scan, decode and align one raw telemetry buffer.
pub fn process(buffer: &[u8], frame_interval: f64) -> (TelemetryTable, DecodeStats) {
    let (channels, stats) = decode_all(buffer);
    (align(channels, frame_interval), stats)
}
