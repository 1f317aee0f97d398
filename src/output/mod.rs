mod error;
mod gpx;
mod interpolate;
mod table;

pub use error::OutputError;
pub use gpx::{write_gpx, TrackClock};
pub use interpolate::{interpolate_frames, read_track, write_frames};
pub use table::write_table;
