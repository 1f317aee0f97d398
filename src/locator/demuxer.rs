use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    process::{Command as StdCommand, Stdio},
    thread,
    time::{Duration, Instant},
};

use super::error::DemuxError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Copies one sub-stream of a media file, without re-encoding, to `out`.
pub trait Demuxer {
    fn copy_stream(&self, media: &Path, selector: &str, out: &Path) -> Result<(), DemuxError>;
}

/// Demuxer backed by an ffmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegDemuxer {
    program: PathBuf,
    timeout: Duration,
}

/// Resolve a demuxer program: paths are taken as given, bare names are
/// looked up on `PATH`.
pub fn resolve_program(program: &str) -> Result<PathBuf, DemuxError> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return Ok(candidate.to_path_buf());
    }
    which::which(program).map_err(|source| DemuxError::ProgramNotFound {
        program: program.to_string(),
        source,
    })
}

impl FfmpegDemuxer {
    pub fn new(program: PathBuf, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, media: &Path, selector: &str, out: &Path) -> StdCommand {
        let mut cmd = StdCommand::new(&self.program);
        cmd.arg("-y")
            .args(["-v", "error"])
            .arg("-i")
            .arg(media)
            .args(["-codec", "copy"])
            .args(["-map", selector])
            .args(["-f", "rawvideo"])
            .arg(out);
        cmd
    }

    /// First line of `<program> -version`.
    pub fn version(&self) -> Result<String, DemuxError> {
        let output = StdCommand::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(DemuxError::Spawn)?;
        if !output.status.success() {
            return Err(DemuxError::Failed(output.status.code()));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string())
    }
}

impl Demuxer for FfmpegDemuxer {
    fn copy_stream(&self, media: &Path, selector: &str, out: &Path) -> Result<(), DemuxError> {
        let stderr_path = out.with_extension("log");
        let stderr_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&stderr_path)?;

        let result = self.run(media, selector, out, stderr_file);

        if let Err(DemuxError::Failed(_)) = &result {
            if let Ok(stderr) = fs::read_to_string(&stderr_path) {
                for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
                    log::debug!("demuxer [{}]: {}", selector, line);
                }
            }
        }
        if let Err(e) = fs::remove_file(&stderr_path) {
            log::warn!("Failed to remove {}: {}", stderr_path.display(), e);
        }
        result
    }
}

impl FfmpegDemuxer {
    fn run(
        &self,
        media: &Path,
        selector: &str,
        out: &Path,
        stderr_file: fs::File,
    ) -> Result<(), DemuxError> {
        let mut child = self
            .command(media, selector, out)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file))
            .spawn()
            .map_err(DemuxError::Spawn)?;

        log::debug!(
            "Demuxing stream {} of {} (PID: {})",
            selector,
            media.display(),
            child.id()
        );

        let started = Instant::now();
        loop {
            let polled = match child.try_wait() {
                Ok(polled) => polled,
                Err(e) => {
                    log::warn!("Failed to poll demuxer PID {}: {}", child.id(), e);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DemuxError::Io(e));
                }
            };
            match polled {
                Some(status) if status.success() => return Ok(()),
                Some(status) => return Err(DemuxError::Failed(status.code())),
                None if started.elapsed() >= self.timeout => {
                    log::warn!(
                        "Demuxing stream {} timed out after {}, killing PID {}",
                        selector,
                        humantime::format_duration(self.timeout),
                        child.id()
                    );
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DemuxError::Timeout(self.timeout));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_copies_the_selected_stream() {
        let demuxer = FfmpegDemuxer::new(PathBuf::from("ffmpeg"), Duration::from_secs(5));
        let cmd = demuxer.command(Path::new("GS010692.360"), "0:3", Path::new("out.bin"));
        let args: Vec<_> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-i", "GS010692.360", "-codec", "copy", "-map", "0:3", "-f",
                "rawvideo", "out.bin"
            ]
        );
        assert_eq!(cmd.get_program(), "ffmpeg");
    }

    #[test]
    fn explicit_paths_are_not_searched() {
        let path = resolve_program("/opt/ffmpeg/bin/ffmpeg").unwrap();
        assert_eq!(path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
    }

    #[test]
    fn unknown_program_is_reported() {
        let err = resolve_program("no-such-demuxer-4f1c").unwrap_err();
        assert!(matches!(err, DemuxError::ProgramNotFound { .. }));
    }

    #[test]
    fn missing_executable_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let demuxer = FfmpegDemuxer::new(
            dir.path().join("no-such-demuxer"),
            Duration::from_secs(5),
        );
        let out = dir.path().join("out.bin");
        let err = demuxer
            .copy_stream(Path::new("in.mp4"), "0:3", &out)
            .unwrap_err();
        assert!(matches!(err, DemuxError::Spawn(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_a_failure() {
        // `sh` rejects the `-y` option and exits with a non-zero status.
        let dir = tempfile::tempdir().unwrap();
        let demuxer = FfmpegDemuxer::new(PathBuf::from("sh"), Duration::from_secs(5));
        let out = dir.path().join("out.bin");
        let err = demuxer
            .copy_stream(Path::new("in.mp4"), "0:3", &out)
            .unwrap_err();
        assert!(matches!(err, DemuxError::Failed(Some(code)) if code != 0));
        assert!(!out.with_extension("log").exists());
    }

    #[cfg(unix)]
    #[test]
    fn hung_demuxer_is_killed_after_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-demuxer");
        fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let demuxer = FfmpegDemuxer::new(script, Duration::from_millis(300));
        let out = dir.path().join("out.bin");
        let started = Instant::now();
        let err = demuxer
            .copy_stream(Path::new("in.mp4"), "0:3", &out)
            .unwrap_err();

        assert!(matches!(err, DemuxError::Timeout(t) if t == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!out.with_extension("log").exists());
    }
}
