use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// A scratch file removed when dropped, whatever path the job takes.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(dir: &Path, stem: &str, selector: &str, extension: &str) -> Self {
        let selector = selector.replace([':', '/', '\\'], "_");
        let name = format!("{}_{}_{}.{}", stem, selector, uuid::Uuid::new_v4(), extension);
        Self {
            path: dir.join(name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed scratch file {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}
