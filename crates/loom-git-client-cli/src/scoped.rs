// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Credential files that live for exactly one command.

use std::path::{Path, PathBuf};
use std::time::Duration;

use loom_git_client_core::{GitError, Result};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// Wait before the single deletion retry. Virus scanners and indexers
/// commonly hold freshly written files open for a moment.
const DELETE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A set of restrictive-permission files owned by one command execution.
///
/// Call [`ScopedFiles::release`] on every exit path. `Drop` removes whatever
/// is left without retrying, which only matters if the task is cancelled.
#[derive(Debug)]
pub struct ScopedFiles {
	dir: PathBuf,
	files: Vec<PathBuf>,
}

impl ScopedFiles {
	/// Files will be created in `dir`, which is created on first use.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			files: Vec::new(),
		}
	}

	pub fn paths(&self) -> &[PathBuf] {
		&self.files
	}

	/// Write data readable only by the owner (0600).
	pub async fn write_secret(&mut self, prefix: &str, suffix: &str, contents: &str) -> Result<PathBuf> {
		self.write(prefix, suffix, contents, 0o600).await
	}

	/// Write a script executable only by the owner (0700).
	pub async fn write_script(&mut self, prefix: &str, suffix: &str, contents: &str) -> Result<PathBuf> {
		self.write(prefix, suffix, contents, 0o700).await
	}

	#[cfg_attr(not(unix), allow(unused_variables))]
	async fn write(&mut self, prefix: &str, suffix: &str, contents: &str, mode: u32) -> Result<PathBuf> {
		fs::create_dir_all(&self.dir)
			.await
			.map_err(|e| GitError::credentials(format!("cannot create {}: {e}", self.dir.display())))?;

		let path = self.dir.join(format!("{prefix}{}{suffix}", Uuid::new_v4().simple()));
		// Track before writing so a partial file is still removed.
		self.files.push(path.clone());

		let written = async {
			#[cfg(unix)]
			{
				use tokio::io::AsyncWriteExt;

				let mut file = fs::OpenOptions::new()
					.write(true)
					.create_new(true)
					.mode(mode)
					.open(&path)
					.await?;
				file.write_all(contents.as_bytes()).await?;
				file.flush().await?;
			}

			#[cfg(not(unix))]
			{
				fs::write(&path, contents).await?;
			}

			Ok::<(), std::io::Error>(())
		}
		.await;

		written.map_err(|e| GitError::credentials(format!("cannot write {}: {e}", path.display())))?;
		debug!(path = %path.display(), "wrote scoped credential file");
		Ok(path)
	}

	/// Delete every file, retrying each failure once after a short delay.
	pub async fn release(mut self) -> Result<()> {
		let mut failures = Vec::new();
		for path in std::mem::take(&mut self.files) {
			if let Err(first) = remove(&path).await {
				warn!(path = %path.display(), error = %first, "failed to delete credential file, retrying");
				tokio::time::sleep(DELETE_RETRY_DELAY).await;
				if let Err(second) = remove(&path).await {
					failures.push(format!("{}: {second}", path.display()));
				}
			}
		}

		if failures.is_empty() {
			Ok(())
		} else {
			Err(GitError::credentials(format!(
				"could not delete credential files: {}",
				failures.join(", ")
			)))
		}
	}
}

async fn remove(path: &Path) -> std::io::Result<()> {
	match fs::remove_file(path).await {
		Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
		other => other,
	}
}

impl Drop for ScopedFiles {
	fn drop(&mut self) {
		for path in &self.files {
			let _ = std::fs::remove_file(path);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn release_deletes_everything() {
		let dir = TempDir::new().unwrap();
		let mut scope = ScopedFiles::new(dir.path().join("ws@tmp"));
		let a = scope.write_secret("key", ".key", "secret").await.unwrap();
		let b = scope.write_script("askpass", ".sh", "#!/bin/sh\n").await.unwrap();
		assert!(a.exists() && b.exists());
		assert_ne!(a, b);

		scope.release().await.unwrap();
		assert!(!a.exists());
		assert!(!b.exists());
	}

	#[tokio::test]
	async fn release_tolerates_already_deleted_files() {
		let dir = TempDir::new().unwrap();
		let mut scope = ScopedFiles::new(dir.path());
		let path = scope.write_secret("k", "", "x").await.unwrap();
		std::fs::remove_file(&path).unwrap();
		assert!(scope.release().await.is_ok());
	}

	#[tokio::test]
	async fn drop_is_a_backstop() {
		let dir = TempDir::new().unwrap();
		let path = {
			let mut scope = ScopedFiles::new(dir.path());
			scope.write_secret("k", "", "x").await.unwrap()
		};
		assert!(!path.exists());
	}

	#[tokio::test]
	#[cfg(unix)]
	async fn files_get_restrictive_permissions() {
		use std::os::unix::fs::PermissionsExt;

		let dir = TempDir::new().unwrap();
		let mut scope = ScopedFiles::new(dir.path());
		let secret = scope.write_secret("k", "", "x").await.unwrap();
		let script = scope.write_script("s", ".sh", "#!/bin/sh\n").await.unwrap();

		let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
		assert_eq!(mode(&secret), 0o600);
		assert_eq!(mode(&script), 0o700);
		scope.release().await.unwrap();
	}

	#[tokio::test]
	async fn unwritable_directory_is_a_credentials_error() {
		let dir = TempDir::new().unwrap();
		let blocker = dir.path().join("file");
		std::fs::write(&blocker, "not a dir").unwrap();
		let mut scope = ScopedFiles::new(blocker.join("sub"));
		let err = scope.write_secret("k", "", "x").await.unwrap_err();
		assert!(matches!(err, GitError::Credentials(_)));
	}
}
