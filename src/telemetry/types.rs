use serde::Serialize;
use strum_macros::Display;

/// One of the four sampled telemetry channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Location,
    Accel,
    Gyro,
    Orientation,
}

impl Channel {
    /// Column order of the serialized table.
    pub const ALL: [Channel; 4] = [
        Channel::Location,
        Channel::Accel,
        Channel::Gyro,
        Channel::Orientation,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: f64,
    pub speed_2d_m_s: f64,
    pub speed_3d_m_s: f64,
}

/// Three-axis sample shared by the accelerometer and gyroscope channels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Camera orientation quaternion, scaled but not normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientationSample {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for OrientationSample {
    fn default() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// Decoded samples of every channel for one buffer, in buffer order.
#[derive(Debug, Clone, Default)]
pub struct ChannelSet {
    pub location: Vec<LocationSample>,
    pub accel: Vec<MotionSample>,
    pub gyro: Vec<MotionSample>,
    pub orientation: Vec<OrientationSample>,
}

impl ChannelSet {
    pub fn len(&self, channel: Channel) -> usize {
        match channel {
            Channel::Location => self.location.len(),
            Channel::Accel => self.accel.len(),
            Channel::Gyro => self.gyro.len(),
            Channel::Orientation => self.orientation.len(),
        }
    }

    /// Channels with at least one sample, in column order.
    pub fn present(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.len(*c) > 0)
            .collect()
    }
}

/// Non-fatal decode conditions. These are counted, never returned as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// The channel's marker never occurred in the buffer.
    EmptyChannel,
    /// A block ended because the next record would overrun the buffer.
    TruncatedRecord,
    /// A record failed a range or sentinel check and was dropped.
    InvalidSample,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    /// The channel's marker never occurred.
    pub empty: bool,
    pub markers: usize,
    pub samples: usize,
    pub truncated_blocks: usize,
    pub invalid_samples: usize,
}

impl ChannelStats {
    pub fn record(&mut self, anomaly: Anomaly) {
        match anomaly {
            Anomaly::EmptyChannel => self.empty = true,
            Anomaly::TruncatedRecord => self.truncated_blocks += 1,
            Anomaly::InvalidSample => self.invalid_samples += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DecodeStats {
    pub location: ChannelStats,
    pub accel: ChannelStats,
    pub gyro: ChannelStats,
    pub orientation: ChannelStats,
}

impl DecodeStats {
    pub fn channel_mut(&mut self, channel: Channel) -> &mut ChannelStats {
        match channel {
            Channel::Location => &mut self.location,
            Channel::Accel => &mut self.accel,
            Channel::Gyro => &mut self.gyro,
            Channel::Orientation => &mut self.orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_names_are_snake_case() {
        assert_eq!(Channel::Accel.to_string(), "accel");
        assert_eq!(Channel::Orientation.to_string(), "orientation");
    }

    #[test]
    fn present_follows_column_order() {
        let set = ChannelSet {
            location: vec![],
            accel: vec![MotionSample::default()],
            gyro: vec![],
            orientation: vec![OrientationSample::default()],
        };
        assert_eq!(set.present(), vec![Channel::Accel, Channel::Orientation]);
    }

    #[test]
    fn anomalies_are_counted() {
        let mut stats = ChannelStats::default();
        stats.record(Anomaly::EmptyChannel);
        stats.record(Anomaly::InvalidSample);
        stats.record(Anomaly::InvalidSample);
        stats.record(Anomaly::TruncatedRecord);
        assert!(stats.empty);
        assert_eq!(stats.invalid_samples, 2);
        assert_eq!(stats.truncated_blocks, 1);
    }

    #[test]
    fn orientation_default_is_identity() {
        let q = OrientationSample::default();
        assert_eq!((q.w, q.x, q.y, q.z), (1.0, 0.0, 0.0, 0.0));
    }
}
