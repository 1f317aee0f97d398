use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::locator::Attempt;
use crate::telemetry::DecodeStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Running,
    Completed,
    StreamNotFound,
    Failed,
}

/// Summary of one conversion job, saved next to its outputs.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub media: PathBuf,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub attempts: Vec<Attempt>,
    pub selected_stream: Option<String>,
    pub buffer_bytes: Option<usize>,
    pub channels: Option<DecodeStats>,
    pub rows: Option<usize>,
    pub outputs: Vec<PathBuf>,
    pub error: Option<String>,
}

impl JobReport {
    pub fn new(media: &Path) -> Self {
        Self {
            media: media.to_path_buf(),
            state: JobState::Running,
            started_at: Utc::now(),
            completed_at: None,
            attempts: Vec::new(),
            selected_stream: None,
            buffer_bytes: None,
            channels: None,
            rows: None,
            outputs: Vec::new(),
            error: None,
        }
    }

    pub fn finish_with_state(&mut self, state: JobState) {
        self.state = state;
        self.completed_at = Some(Utc::now());
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        fs::write(
            path,
            serde_yaml::to_string(self)
                .map_err(|e| io::Error::other(format!("Failed to serialize report: {}", e)))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::AttemptOutcome;

    #[test]
    fn saves_yaml_with_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = JobReport::new(Path::new("GS010692.360"));
        report.attempts.push(Attempt {
            selector: "0:3".to_string(),
            outcome: AttemptOutcome::DemuxFailed {
                reason: "demuxer exited with status 1".to_string(),
            },
            size_bytes: None,
        });
        report.attempts.push(Attempt {
            selector: "0:2".to_string(),
            outcome: AttemptOutcome::Accepted,
            size_bytes: Some(4096),
        });
        report.selected_stream = Some("0:2".to_string());
        report.finish_with_state(JobState::Completed);

        let path = dir.path().join("report.yaml");
        report.save(&path).unwrap();

        let value: serde_yaml::Value =
            serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["state"].as_str(), Some("completed"));
        assert_eq!(value["selected_stream"].as_str(), Some("0:2"));
        assert_eq!(value["attempts"][0]["result"].as_str(), Some("demux_failed"));
        assert_eq!(
            value["attempts"][0]["reason"].as_str(),
            Some("demuxer exited with status 1")
        );
        assert_eq!(value["attempts"][1]["size_bytes"].as_u64(), Some(4096));
        assert!(value["completed_at"].as_str().is_some());
    }
}
