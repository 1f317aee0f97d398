use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::types::Attempt;

#[derive(Debug, Error)]
pub enum DemuxError {
    #[error("demuxer {program} not found: {source}")]
    ProgramNotFound {
        program: String,
        source: which::Error,
    },
    #[error("failed to spawn demuxer: {0}")]
    Spawn(std::io::Error),
    #[error("demuxer timed out after {0:?}")]
    Timeout(Duration),
    #[error("demuxer exited with {}", status_text(.0))]
    Failed(Option<i32>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no telemetry stream found in {} (tried {})", .media.display(), tried(.attempts))]
    StreamNotFound {
        media: PathBuf,
        attempts: Vec<Attempt>,
    },
    #[error("scratch directory error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

fn tried(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| a.selector.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
