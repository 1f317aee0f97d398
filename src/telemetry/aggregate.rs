use super::types::{Channel, ChannelSet, LocationSample, MotionSample, OrientationSample};

/// Assumed capture rate behind the synthesized row clock.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// One aligned table row. Absent fields mean the channel ran out of samples
/// before this row.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRow {
    pub index: usize,
    pub timestamp_s: f64,
    pub location: Option<LocationSample>,
    pub accel: Option<MotionSample>,
    pub gyro: Option<MotionSample>,
    pub orientation: Option<OrientationSample>,
}

#[derive(Debug, Clone)]
pub struct TelemetryTable {
    /// Channels with any samples at all; only these get columns.
    pub present: Vec<Channel>,
    pub rows: Vec<TelemetryRow>,
}

/// Merge independently rated channels into index-aligned rows.
///
/// Row count is the longest channel's length, never less than one, and row
/// `i` is stamped `i * frame_interval`.
pub fn align(channels: ChannelSet, frame_interval: f64) -> TelemetryTable {
    let present = channels.present();
    let count = Channel::ALL
        .iter()
        .map(|c| channels.len(*c))
        .max()
        .unwrap_or(0)
        .max(1);

    let ChannelSet {
        location,
        accel,
        gyro,
        orientation,
    } = channels;
    let mut location = location.into_iter();
    let mut accel = accel.into_iter();
    let mut gyro = gyro.into_iter();
    let mut orientation = orientation.into_iter();

    let rows = (0..count)
        .map(|index| TelemetryRow {
            index,
            timestamp_s: index as f64 * frame_interval,
            location: location.next(),
            accel: accel.next(),
            gyro: gyro.next(),
            orientation: orientation.next(),
        })
        .collect::<Vec<_>>();

    log::debug!("Aligned {} rows across {:?}", rows.len(), present);
    TelemetryTable { present, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::fixtures::FRAME_INTERVAL;

    fn channels(l: usize, a: usize, g: usize, o: usize) -> ChannelSet {
        ChannelSet {
            location: vec![
                LocationSample {
                    latitude: 1.0,
                    longitude: 2.0,
                    ..Default::default()
                };
                l
            ],
            accel: vec![MotionSample::default(); a],
            gyro: vec![MotionSample::default(); g],
            orientation: vec![OrientationSample::default(); o],
        }
    }

    #[test]
    fn row_count_follows_longest_channel() {
        let table = align(channels(3, 5, 0, 2), FRAME_INTERVAL);
        assert_eq!(table.rows.len(), 5);
        assert_eq!(
            table.present,
            vec![Channel::Location, Channel::Accel, Channel::Orientation]
        );

        let row3 = &table.rows[3];
        assert!(row3.location.is_none());
        assert!(row3.accel.is_some());
        assert!(row3.orientation.is_none());

        let row4 = &table.rows[4];
        assert!(row4.accel.is_some());
        assert!(row4.orientation.is_none());
        assert!(table.rows.iter().all(|r| r.gyro.is_none()));
    }

    #[test]
    fn empty_channels_still_yield_one_row() {
        let table = align(ChannelSet::default(), FRAME_INTERVAL);
        assert_eq!(table.rows.len(), 1);
        assert!(table.present.is_empty());
        assert_eq!(table.rows[0].index, 0);
        assert_eq!(table.rows[0].timestamp_s, 0.0);
    }

    #[test]
    fn timestamps_use_frame_interval() {
        let table = align(channels(0, 4, 0, 0), 0.5);
        let stamps: Vec<_> = table.rows.iter().map(|r| r.timestamp_s).collect();
        assert_eq!(stamps, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(
            table.rows.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }
}
