use std::{
    fs,
    path::{Path, PathBuf},
};

use super::demuxer::Demuxer;
use super::error::LocateError;
use super::scratch::ScratchFile;
use super::types::{Attempt, AttemptOutcome, Located, RawTelemetryBuffer};

/// Finds the telemetry sub-stream of a media file by trying candidate
/// selectors in order.
pub struct StreamLocator<'a, D: Demuxer> {
    demuxer: &'a D,
    scratch_dir: PathBuf,
    min_size_bytes: u64,
}

impl<'a, D: Demuxer> StreamLocator<'a, D> {
    pub fn new(demuxer: &'a D, scratch_dir: PathBuf, min_size_bytes: u64) -> Self {
        Self {
            demuxer,
            scratch_dir,
            min_size_bytes,
        }
    }

    /// Return the first candidate whose copied stream is larger than the
    /// minimum size. Every scratch file is removed before returning.
    pub fn locate(&self, media: &Path, candidates: &[String]) -> Result<Located, LocateError> {
        fs::create_dir_all(&self.scratch_dir)?;
        let stem = media
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "media".to_string());

        let mut attempts = Vec::with_capacity(candidates.len());
        for selector in candidates {
            let scratch = ScratchFile::new(&self.scratch_dir, &stem, selector, "bin");
            let (mut outcome, size) = self.try_candidate(media, selector, &scratch);

            let mut bytes = None;
            if outcome == AttemptOutcome::Accepted {
                match fs::read(scratch.path()) {
                    Ok(b) => bytes = Some(b),
                    Err(e) => {
                        outcome = AttemptOutcome::Unreadable {
                            reason: e.to_string(),
                        }
                    }
                }
            }

            log::info!(
                "Stream {} of {}: {:?} ({} bytes)",
                selector,
                media.display(),
                outcome,
                size.unwrap_or(0)
            );

            attempts.push(Attempt {
                selector: selector.clone(),
                outcome,
                size_bytes: size,
            });

            if let Some(bytes) = bytes {
                return Ok(Located {
                    selector: selector.clone(),
                    buffer: RawTelemetryBuffer::new(bytes),
                    attempts,
                });
            }
        }

        Err(LocateError::StreamNotFound {
            media: media.to_path_buf(),
            attempts,
        })
    }

    fn try_candidate(
        &self,
        media: &Path,
        selector: &str,
        scratch: &ScratchFile,
    ) -> (AttemptOutcome, Option<u64>) {
        if let Err(e) = self.demuxer.copy_stream(media, selector, scratch.path()) {
            let size = fs::metadata(scratch.path()).ok().map(|m| m.len());
            return (
                AttemptOutcome::DemuxFailed {
                    reason: e.to_string(),
                },
                size,
            );
        }
        match fs::metadata(scratch.path()) {
            Ok(meta) if !meta.is_file() => (
                AttemptOutcome::Unreadable {
                    reason: "output is not a regular file".to_string(),
                },
                None,
            ),
            Ok(meta) if meta.len() > self.min_size_bytes => {
                (AttemptOutcome::Accepted, Some(meta.len()))
            }
            Ok(meta) => (AttemptOutcome::Undersized, Some(meta.len())),
            Err(_) => (AttemptOutcome::Missing, None),
        }
    }
}
