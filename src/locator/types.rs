use serde::Serialize;

/// Raw bytes of the telemetry stream copied out of the media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTelemetryBuffer(Vec<u8>);

impl RawTelemetryBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    Undersized,
    Missing,
    DemuxFailed { reason: String },
    /// The demuxer succeeded but its output could not be read back.
    Unreadable { reason: String },
}

/// Record of one candidate selector tried by the locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attempt {
    pub selector: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub size_bytes: Option<u64>,
}

/// The first accepted candidate and everything tried to find it.
#[derive(Debug)]
pub struct Located {
    pub selector: String,
    pub buffer: RawTelemetryBuffer,
    pub attempts: Vec<Attempt>,
}
