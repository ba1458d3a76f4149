//! Exclusive advisory lock on an index directory, held for the length of a build.
use anyhow::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use groundqa_core::error::Error;

pub const LOCK_FILE_NAME: &str = ".groundqa.lock";

/// Released on drop, whichever way the build exits.
#[derive(Debug)]
pub struct IndexLock {
	file: File,
	path: PathBuf,
}

impl IndexLock {
	/// Fails fast with `Error::IndexLocked` if another build holds the lock.
	pub fn acquire(index_dir: &Path) -> Result<Self> {
		std::fs::create_dir_all(index_dir)?;
		let path = index_dir.join(LOCK_FILE_NAME);
		let file = OpenOptions::new().create(true).read(true).write(true).truncate(false).open(&path)?;
		if let Err(e) = file.try_lock_exclusive() {
			if e.kind() == fs2::lock_contended_error().kind() {
				return Err(Error::IndexLocked(index_dir.to_path_buf()).into());
			}
			return Err(anyhow::Error::new(e).context(format!("locking {}", path.display())));
		}
		tracing::debug!(lock = %path.display(), "Acquired index lock");
		Ok(Self { file, path })
	}
}

impl Drop for IndexLock {
	fn drop(&mut self) {
		if let Err(e) = FileExt::unlock(&self.file) {
			tracing::warn!(lock = %self.path.display(), error = %e, "Failed to release index lock");
		}
	}
}
