use super::types::Channel;

pub const MARKER_LEN: usize = 4;

pub type Marker = [u8; MARKER_LEN];

// Field scale divisors.
pub const LAT_LON_SCALE: f64 = 10_000_000.0;
pub const ALTITUDE_SCALE: f64 = 1_000.0;
pub const SPEED_SCALE: f64 = 1_000.0;
pub const MOTION_SCALE: f64 = 1_000.0;
pub const ORIENTATION_SCALE: f64 = 32_767.0;

/// Fixed record layout of one channel's data blocks.
///
/// Blocks are not self-describing: the payload starts `header_skip` bytes
/// after the marker and holds up to `max_samples` records of `stride`
/// bytes each. Decoders read these values only through [`Channel::layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub marker: Marker,
    pub header_skip: usize,
    pub stride: usize,
    pub max_samples: usize,
}

const LOCATION: ChannelLayout = ChannelLayout {
    marker: *b"GPS5",
    header_skip: 8,
    stride: 20,
    max_samples: 20,
};

const ACCEL: ChannelLayout = ChannelLayout {
    marker: *b"ACCL",
    header_skip: 12,
    stride: 6,
    max_samples: 100,
};

const GYRO: ChannelLayout = ChannelLayout {
    marker: *b"GYRO",
    header_skip: 12,
    stride: 6,
    max_samples: 100,
};

const ORIENTATION: ChannelLayout = ChannelLayout {
    marker: *b"CORI",
    header_skip: 12,
    stride: 8,
    max_samples: 100,
};

impl Channel {
    pub fn layout(self) -> &'static ChannelLayout {
        match self {
            Channel::Location => &LOCATION,
            Channel::Accel => &ACCEL,
            Channel::Gyro => &GYRO,
            Channel::Orientation => &ORIENTATION,
        }
    }

    pub fn marker_str(self) -> &'static str {
        match self {
            Channel::Location => "GPS5",
            Channel::Accel => "ACCL",
            Channel::Gyro => "GYRO",
            Channel::Orientation => "CORI",
        }
    }
}
