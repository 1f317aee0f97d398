use byteorder::{ByteOrder, LittleEndian};

use super::layout::{
    ChannelLayout, ALTITUDE_SCALE, LAT_LON_SCALE, MOTION_SCALE, ORIENTATION_SCALE, SPEED_SCALE,
};
use super::scanner::find_marker;
use super::types::{
    Anomaly, Channel, ChannelSet, ChannelStats, DecodeStats, LocationSample, MotionSample,
    OrientationSample,
};

/// A sample type decodable from one fixed-stride record.
///
/// Accelerometer and gyroscope share [`MotionSample`]; the channel being
/// decoded is chosen by the caller of [`decode_channel`].
pub trait Sample: Sized {
    /// Decode one record of exactly `layout().stride` bytes. `None` means the
    /// record failed validation and is dropped.
    fn from_record(record: &[u8]) -> Option<Self>;
}

impl Sample for LocationSample {
    fn from_record(record: &[u8]) -> Option<Self> {
        let sample = LocationSample {
            latitude: LittleEndian::read_i32(&record[0..4]) as f64 / LAT_LON_SCALE,
            longitude: LittleEndian::read_i32(&record[4..8]) as f64 / LAT_LON_SCALE,
            altitude_m: LittleEndian::read_i32(&record[8..12]) as f64 / ALTITUDE_SCALE,
            speed_2d_m_s: LittleEndian::read_i32(&record[12..16]) as f64 / SPEED_SCALE,
            speed_3d_m_s: LittleEndian::read_i32(&record[16..20]) as f64 / SPEED_SCALE,
        };
        is_valid_location(&sample).then_some(sample)
    }
}

impl Sample for MotionSample {
    fn from_record(record: &[u8]) -> Option<Self> {
        Some(MotionSample {
            x: LittleEndian::read_i16(&record[0..2]) as f64 / MOTION_SCALE,
            y: LittleEndian::read_i16(&record[2..4]) as f64 / MOTION_SCALE,
            z: LittleEndian::read_i16(&record[4..6]) as f64 / MOTION_SCALE,
        })
    }
}

impl Sample for OrientationSample {
    fn from_record(record: &[u8]) -> Option<Self> {
        Some(OrientationSample {
            w: LittleEndian::read_i16(&record[0..2]) as f64 / ORIENTATION_SCALE,
            x: LittleEndian::read_i16(&record[2..4]) as f64 / ORIENTATION_SCALE,
            y: LittleEndian::read_i16(&record[4..6]) as f64 / ORIENTATION_SCALE,
            z: LittleEndian::read_i16(&record[6..8]) as f64 / ORIENTATION_SCALE,
        })
    }
}

fn is_valid_location(s: &LocationSample) -> bool {
    (-90.0..=90.0).contains(&s.latitude)
        && (-180.0..=180.0).contains(&s.longitude)
        && !(s.latitude == 0.0 && s.longitude == 0.0)
        && s.speed_2d_m_s >= 0.0
        && s.speed_3d_m_s >= 0.0
}

/// Fixed-stride records of one block, starting `header_skip` bytes after
/// the marker. Yields at most `max_samples` records and stops before any
/// record that would run past the end of the buffer.
pub struct Records<'a> {
    buffer: &'a [u8],
    cursor: usize,
    stride: usize,
    remaining: usize,
    truncated: bool,
}

impl<'a> Records<'a> {
    pub fn new(buffer: &'a [u8], marker_offset: usize, layout: &ChannelLayout) -> Self {
        Self {
            buffer,
            cursor: marker_offset.saturating_add(layout.header_skip),
            stride: layout.stride,
            remaining: layout.max_samples,
            truncated: false,
        }
    }

    /// Whether the block ended on a record that would overrun the buffer.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.remaining == 0 {
            return None;
        }
        let end = match self.cursor.checked_add(self.stride) {
            Some(end) if end <= self.buffer.len() => end,
            _ => {
                self.truncated = true;
                self.remaining = 0;
                return None;
            }
        };
        let record = &self.buffer[self.cursor..end];
        self.cursor = end;
        self.remaining -= 1;
        Some(record)
    }
}

/// Decode every block of `channel` in the buffer, accumulating samples from
/// all marker occurrences in order.
pub fn decode_channel<S: Sample>(buffer: &[u8], channel: Channel) -> (Vec<S>, ChannelStats) {
    let layout = channel.layout();
    let mut samples = Vec::new();
    let mut stats = ChannelStats::default();

    for offset in find_marker(buffer, layout.marker, 0) {
        stats.markers += 1;
        let mut records = Records::new(buffer, offset, layout);
        for record in records.by_ref() {
            match S::from_record(record) {
                Some(sample) => samples.push(sample),
                None => stats.record(Anomaly::InvalidSample),
            }
        }
        if records.truncated() {
            log::debug!(
                "{} block at offset {} truncated by end of buffer",
                channel.marker_str(),
                offset
            );
            stats.record(Anomaly::TruncatedRecord);
        }
    }

    if stats.markers == 0 {
        log::debug!("No {} markers found", channel.marker_str());
        stats.record(Anomaly::EmptyChannel);
    }
    stats.samples = samples.len();
    (samples, stats)
}

/// Decode all four channels from one raw buffer.
pub fn decode_all(buffer: &[u8]) -> (ChannelSet, DecodeStats) {
    let mut stats = DecodeStats::default();

    let (location, s) = decode_channel::<LocationSample>(buffer, Channel::Location);
    *stats.channel_mut(Channel::Location) = s;
    let (accel, s) = decode_channel::<MotionSample>(buffer, Channel::Accel);
    *stats.channel_mut(Channel::Accel) = s;
    let (gyro, s) = decode_channel::<MotionSample>(buffer, Channel::Gyro);
    *stats.channel_mut(Channel::Gyro) = s;
    let (orientation, s) = decode_channel::<OrientationSample>(buffer, Channel::Orientation);
    *stats.channel_mut(Channel::Orientation) = s;

    for channel in Channel::ALL {
        let s = stats.channel_mut(channel);
        if s.invalid_samples > 0 {
            log::warn!(
                "Dropped {} invalid {} records",
                s.invalid_samples,
                channel.marker_str()
            );
        }
        log::info!(
            "{}: {} markers, {} samples",
            channel.marker_str(),
            s.markers,
            s.samples
        );
    }

    (
        ChannelSet {
            location,
            accel,
            gyro,
            orientation,
        },
        stats,
    )
}
