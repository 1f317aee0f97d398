mod demuxer;
mod error;
mod locator;
mod scratch;
mod types;

pub use demuxer::{resolve_program, Demuxer, FfmpegDemuxer};
pub use error::LocateError;
pub use locator::StreamLocator;
pub use types::Attempt;

#[cfg(test)]
pub(crate) use error::DemuxError;
#[cfg(test)]
pub(crate) use locator::tests::FakeDemuxer;
#[cfg(test)]
pub(crate) use types::AttemptOutcome;
