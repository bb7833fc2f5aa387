// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Reads and writes of the repository-local `.git/config`.

use std::path::{Path, PathBuf};

use gix::bstr::ByteSlice;
use loom_git_client_core::{GitError, Result};

fn config_path(repo: &gix::Repository) -> PathBuf {
	repo.path().join("config")
}

fn load(path: &Path) -> Result<gix::config::File<'static>> {
	gix::config::File::from_path_no_includes(path.to_path_buf(), gix::config::Source::Local)
		.map_err(|e| GitError::backend(format!("could not read {}: {e}", path.display())))
}

/// Write `file` beside `path` and rename it into place, so a failed write
/// leaves the previous config intact.
fn store(path: &Path, file: &gix::config::File<'_>) -> Result<()> {
	let dir = path
		.parent()
		.ok_or_else(|| GitError::backend(format!("{} has no parent directory", path.display())))?;
	let mut out = tempfile::Builder::new().prefix(".config").tempfile_in(dir)?;
	file.write_to(out.as_file_mut())?;
	out.persist(path).map_err(|e| GitError::Io(e.error))?;
	Ok(())
}

/// `<section>.<subsection>.<key>` from the local config file, read fresh
/// from disk so earlier edits in this process are visible.
pub fn get(repo: &gix::Repository, section: &str, subsection: &str, key: &str) -> Result<Option<String>> {
	let file = load(&config_path(repo))?;
	Ok(file
		.string_by(section, Some(subsection.as_bytes().as_bstr()), key)
		.map(|v| v.to_str_lossy().into_owned()))
}

pub fn set(repo: &gix::Repository, section: &str, subsection: &str, key: &str, value: &str) -> Result<()> {
	let path = config_path(repo);
	let mut file = load(&path)?;
	file.set_raw_value_by(
		section,
		Some(subsection.as_bytes().as_bstr()),
		key.to_owned(),
		value.as_bytes().as_bstr(),
	)
	.map_err(GitError::backend)?;
	store(&path, &file)
}

/// Subsection names and values of every `<section>.<name>.<key>` entry.
pub fn entries(repo: &gix::Repository, section: &str, key: &str) -> Result<Vec<(String, String)>> {
	let file = load(&config_path(repo))?;
	let Some(sections) = file.sections_by_name(section) else {
		return Ok(Vec::new());
	};
	Ok(sections
		.filter_map(|s| {
			let name = s.header().subsection_name()?.to_str_lossy().into_owned();
			let value = s.value(key)?.to_str_lossy().into_owned();
			Some((name, value))
		})
		.collect())
}

/// One `[submodule "<name>"]` section of `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
	pub name: String,
	pub path: String,
	pub url: String,
}

/// Submodules declared in `<work_tree>/.gitmodules`; none when the file is
/// absent.
pub fn gitmodules(work_tree: &Path) -> Result<Vec<Module>> {
	let path = work_tree.join(".gitmodules");
	if !path.is_file() {
		return Ok(Vec::new());
	}
	let file = load(&path)?;
	let Some(sections) = file.sections_by_name("submodule") else {
		return Ok(Vec::new());
	};
	Ok(sections
		.filter_map(|s| {
			let name = s.header().subsection_name()?.to_str_lossy().into_owned();
			let url = s.value("url")?.to_str_lossy().into_owned();
			let path = s
				.value("path")
				.map(|p| p.to_str_lossy().into_owned())
				.unwrap_or_else(|| name.clone());
			Some(Module { name, path, url })
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_then_get_round_trips_through_disk() {
		let dir = tempfile::tempdir().unwrap();
		let repo = gix::init(dir.path()).unwrap();

		set(&repo, "remote", "origin", "url", "https://example.com/r.git").unwrap();
		set(&repo, "submodule", "has space", "url", "git@host:org/repo.git").unwrap();

		assert_eq!(
			get(&repo, "remote", "origin", "url").unwrap().as_deref(),
			Some("https://example.com/r.git")
		);
		assert_eq!(get(&repo, "remote", "upstream", "url").unwrap(), None);
		assert_eq!(
			entries(&repo, "submodule", "url").unwrap(),
			vec![("has space".to_string(), "git@host:org/repo.git".to_string())]
		);

		set(&repo, "remote", "origin", "url", "https://example.com/moved.git").unwrap();
		assert_eq!(
			get(&repo, "remote", "origin", "url").unwrap().as_deref(),
			Some("https://example.com/moved.git")
		);
	}

	#[test]
	fn set_replaces_config_without_leaving_scratch_files() {
		let dir = tempfile::tempdir().unwrap();
		let repo = gix::init(dir.path()).unwrap();
		let key = String::from("pushurl");

		set(&repo, "remote", "origin", &key, "https://example.com/push.git").unwrap();

		let leftovers: Vec<_> = std::fs::read_dir(repo.path())
			.unwrap()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_name().to_string_lossy().starts_with(".config"))
			.collect();
		assert!(leftovers.is_empty());
		let text = std::fs::read_to_string(repo.path().join("config")).unwrap();
		assert!(text.contains("[core]"), "existing sections kept: {text}");
		assert!(text.contains("pushurl = https://example.com/push.git"), "{text}");
	}

	#[test]
	fn gitmodules_sections_are_listed() {
		let dir = tempfile::tempdir().unwrap();
		assert!(gitmodules(dir.path()).unwrap().is_empty());

		std::fs::write(
			dir.path().join(".gitmodules"),
			"[submodule \"lib\"]\n\tpath = vendor/lib\n\turl = https://example.com/lib.git\n[submodule \"bare\"]\n\turl = ../bare.git\n",
		)
		.unwrap();
		let modules = gitmodules(dir.path()).unwrap();
		assert_eq!(
			modules,
			vec![
				Module {
					name: "lib".to_string(),
					path: "vendor/lib".to_string(),
					url: "https://example.com/lib.git".to_string(),
				},
				Module {
					name: "bare".to_string(),
					path: "bare".to_string(),
					url: "../bare.git".to_string(),
				},
			]
		);
	}
}
