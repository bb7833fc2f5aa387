// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use gix::bstr::ByteSlice;
use loom_git_client_core::urls::{is_url, redact_url};
use loom_git_client_core::{
	BackendContext, BackendKind, CheckoutOptions, CloneOptions, CommitInfo, FetchOptions, GitBackend,
	GitError, LogOptions, MergeOptions, MergeOutcome, PushOptions, Result, SubmoduleEntry,
	SubmoduleUpdateOptions,
};
use tracing::{debug, info, instrument};

use crate::config;
use crate::credentials::register_url_credentials;
use crate::deadline::Deadline;
use crate::ops;
use crate::ops::fetch::Source;
use crate::protocol::check_url;
use crate::transport::Transport;

const BACKEND: &str = "embedded";

/// Git backend running gitoxide in-process on the blocking thread pool.
///
/// Timeouts are best effort: at the deadline an interrupt flag is raised
/// that gitoxide polls between transfer and checkout steps, and the failure
/// is reported as [`GitError::Timeout`]. A step that never polls the flag,
/// such as a stalled connect, is not cut short. Push and submodule add are
/// not available; they fail with [`GitError::Unsupported`] once their URL
/// has been checked.
pub struct EmbeddedGitBackend {
	context: BackendContext,
}

/// A remote argument resolved to where it points.
struct Resolved {
	source: Source,
	url: String,
	parsed: gix::Url,
}

impl EmbeddedGitBackend {
	pub fn new(context: BackendContext) -> Self {
		Self { context }
	}

	/// Run `f` on the blocking pool with a copy of the context.
	async fn blocking<T, F>(&self, f: F) -> Result<T>
	where
		T: Send + 'static,
		F: FnOnce(BackendContext) -> Result<T> + Send + 'static,
	{
		let context = self.context.clone();
		tokio::task::spawn_blocking(move || f(context))
			.await
			.map_err(|e| GitError::backend(format!("task join error: {e}")))?
	}

	fn arm(&self, operation: &str, target: &str, timeout: Option<u64>) -> Deadline {
		Deadline::arm(
			format!(" > {operation} {}", redact_url(target)),
			timeout,
			self.context.sink.as_ref(),
		)
	}
}

/// True when `remote` is a URL or path rather than a configured name.
fn is_location(remote: &str) -> bool {
	is_url(remote) || Path::new(remote).is_absolute() || remote.starts_with('.')
}

/// Resolve a remote name or location, checking its protocol and registering
/// any credentials embedded in the URL.
fn resolve(repo: &gix::Repository, context: &BackendContext, remote: &str) -> Result<Resolved> {
	let (source, url) = if is_location(remote) {
		(None, remote.to_string())
	} else {
		let url = config::get(repo, "remote", remote, "url")?
			.ok_or_else(|| GitError::config(format!("remote '{remote}' is not configured")))?;
		(Some(Source::Named(remote.to_string())), url)
	};
	let parsed = check_url(&url)?;
	register_url_credentials(&context.credentials, &url);
	Ok(Resolved {
		source: source.unwrap_or_else(|| Source::Url(parsed.clone())),
		url,
		parsed,
	})
}

/// The repository at `work_tree`, or a scratch bare repository for
/// listing remotes from outside one.
fn open_or_scratch(work_tree: &Path) -> Result<(std::path::PathBuf, Option<tempfile::TempDir>)> {
	if ops::open(work_tree, &[]).is_ok() {
		return Ok((work_tree.to_path_buf(), None));
	}
	let scratch = tempfile::tempdir()?;
	gix::init_bare(scratch.path()).map_err(GitError::backend)?;
	Ok((scratch.path().to_path_buf(), Some(scratch)))
}

#[async_trait]
impl GitBackend for EmbeddedGitBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Embedded
	}

	fn context(&self) -> &BackendContext {
		&self.context
	}

	async fn init(&self) -> Result<()> {
		self.blocking(|context| {
			let work_tree = context.work_tree();
			if ops::open(work_tree, &[]).is_ok() {
				return Ok(());
			}
			std::fs::create_dir_all(work_tree)?;
			gix::init(work_tree).map_err(GitError::backend)?;
			Ok(())
		})
		.await
	}

	async fn has_repository(&self) -> bool {
		self.blocking(|context| Ok(ops::open(context.work_tree(), &[]).is_ok()))
			.await
			.unwrap_or(false)
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn clone_repository(&self, options: &CloneOptions) -> Result<()> {
		let url = options.url()?.to_string();
		let parsed = check_url(&url)?;
		register_url_credentials(&self.context.credentials, &url);

		let deadline = self.arm("clone", &url, options.timeout);
		let interrupt = deadline.flag();
		let options = options.clone();
		self.blocking(move |context| {
			let transport = Transport::prepare(&context, &parsed, &url)?;
			ops::clone::clone(context.work_tree(), parsed, &options, &transport, &interrupt)?;
			info!(url = %redact_url(&url), "cloned repository");
			Ok(())
		})
		.await
		.map_err(|e| deadline.classify(e))
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn fetch(&self, options: &FetchOptions) -> Result<()> {
		let remote = options.remote()?.to_string();
		if is_location(&remote) {
			check_url(&remote)?;
		}

		let deadline = self.arm("fetch", &remote, options.timeout);
		let interrupt = deadline.flag();
		let options = options.clone();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			let resolved = resolve(&repo, &context, &remote)?;
			let transport = Transport::prepare(&context, &resolved.parsed, &resolved.url)?;
			let repo = ops::open(context.work_tree(), transport.overrides())?;
			ops::fetch::fetch(&repo, &resolved.source, &options, &transport, &interrupt)
		})
		.await
		.map_err(|e| deadline.classify(e))
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn checkout(&self, options: &CheckoutOptions) -> Result<()> {
		let options = options.clone();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			ops::checkout::checkout(&repo, &options)
		})
		.await
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn merge(&self, options: &MergeOptions) -> Result<MergeOutcome> {
		let options = options.clone();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			let outcome = ops::merge::merge(&repo, &options)?;
			debug!(?outcome, "merge finished");
			Ok(outcome)
		})
		.await
	}

	async fn push(&self, options: &PushOptions) -> Result<()> {
		let remote = options.remote()?.to_string();
		options.refspec()?;
		if is_location(&remote) {
			check_url(&remote)?;
		}
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			resolve(&repo, &context, &remote)?;
			Err(GitError::Unsupported {
				backend: BACKEND,
				operation: "push",
			})
		})
		.await
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn submodule_update(&self, options: &SubmoduleUpdateOptions) -> Result<()> {
		if options.remote_tracking {
			return Err(GitError::Unsupported {
				backend: BACKEND,
				operation: "submodule update from remote-tracking branches",
			});
		}
		if options.reference.is_some() || options.threads.is_some() {
			debug!("reference repositories and parallel jobs are not used by the embedded backend");
		}

		let deadline = self.arm("submodule update", &self.context.work_tree().display().to_string(), options.timeout);
		let interrupt = deadline.flag();
		let options = options.clone();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			let parent_url = match config::get(&repo, "remote", "origin", "url")? {
				Some(url) => Some(url),
				None => match repo.remote_names().iter().next() {
					Some(name) => config::get(&repo, "remote", &name.to_str_lossy(), "url")?,
					None => None,
				},
			};
			ops::submodule::update(&context, context.work_tree(), parent_url.as_deref(), &options, &interrupt)
		})
		.await
		.map_err(|e| deadline.classify(e))
	}

	async fn log(&self, options: &LogOptions) -> Result<Vec<CommitInfo>> {
		let options = options.clone();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			ops::log::log(&repo, &options)
		})
		.await
	}

	async fn rev_parse(&self, revision: &str) -> Result<Option<String>> {
		let revision = revision.to_string();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			Ok(ops::resolve_commit(&repo, &revision).map(|id| id.to_string()))
		})
		.await
	}

	async fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
		let name = name.to_string();
		let message = message.map(str::to_string);
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			ops::refs::tag(&repo, &name, message.as_deref())
		})
		.await
	}

	async fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>> {
		let pattern = pattern.map(str::to_string);
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			ops::refs::tag_names(&repo, pattern.as_deref())
		})
		.await
	}

	async fn remote_names(&self) -> Result<Vec<String>> {
		self.blocking(|context| {
			let repo = ops::open(context.work_tree(), &[])?;
			Ok(repo
				.remote_names()
				.iter()
				.map(|name| name.to_str_lossy().into_owned())
				.collect())
		})
		.await
	}

	async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
		let remote = remote.to_string();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			match config::get(&repo, "remote", &remote, "url")? {
				Some(url) => {
					check_url(&url)?;
					register_url_credentials(&context.credentials, &url);
					Ok(Some(url))
				}
				None => Ok(None),
			}
		})
		.await
	}

	async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
		check_url(url)?;
		register_url_credentials(&self.context.credentials, url);
		let (remote, url) = (remote.to_string(), url.to_string());
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			config::set(&repo, "remote", &remote, "url", &url)
		})
		.await
	}

	async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
		check_url(url)?;
		register_url_credentials(&self.context.credentials, url);
		let (remote, url) = (remote.to_string(), url.to_string());
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			if config::get(&repo, "remote", &remote, "url")?.is_some() {
				return Err(GitError::config(format!("remote '{remote}' already exists")));
			}
			config::set(&repo, "remote", &remote, "url", &url)?;
			config::set(
				&repo,
				"remote",
				&remote,
				"fetch",
				&format!("+refs/heads/*:refs/remotes/{remote}/*"),
			)
		})
		.await
	}

	async fn remote_references(
		&self,
		url: &str,
		pattern: Option<&str>,
		heads: bool,
		tags: bool,
	) -> Result<BTreeMap<String, String>> {
		if is_location(url) {
			check_url(url)?;
		}
		let deadline = self.arm("ls-remote", url, None);
		let (url, pattern) = (url.to_string(), pattern.map(str::to_string));
		self.blocking(move |context| {
			let (base, _scratch) = open_or_scratch(context.work_tree())?;
			let repo = ops::open(&base, &[])?;
			let resolved = resolve(&repo, &context, &url)?;
			let transport = Transport::prepare(&context, &resolved.parsed, &resolved.url)?;
			let repo = ops::open(&base, transport.overrides())?;
			ops::refs::remote_references(&repo, resolved.parsed, pattern.as_deref(), heads, tags, &transport)
		})
		.await
		.map_err(|e| deadline.classify(e))
	}

	async fn prune(&self, remote: &str) -> Result<()> {
		if is_location(remote) {
			check_url(remote)?;
			return Err(GitError::config("prune needs a configured remote name"));
		}
		let deadline = self.arm("remote prune", remote, None);
		let remote = remote.to_string();
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			let resolved = resolve(&repo, &context, &remote)?;
			let transport = Transport::prepare(&context, &resolved.parsed, &resolved.url)?;
			let repo = ops::open(context.work_tree(), transport.overrides())?;
			ops::fetch::prune(&repo, &remote, &transport)
		})
		.await
		.map_err(|e| deadline.classify(e))
	}

	async fn add_submodule(&self, url: &str, _path: &str) -> Result<()> {
		check_url(url)?;
		register_url_credentials(&self.context.credentials, url);
		Err(GitError::Unsupported {
			backend: BACKEND,
			operation: "submodule add",
		})
	}

	async fn submodule_urls(&self) -> Result<Vec<SubmoduleEntry>> {
		self.blocking(|context| {
			let repo = ops::open(context.work_tree(), &[])?;
			Ok(config::entries(&repo, "submodule", "url")?
				.into_iter()
				.map(|(name, url)| SubmoduleEntry { name, url })
				.collect())
		})
		.await
	}

	async fn set_submodule_url(&self, name: &str, url: &str) -> Result<()> {
		let (name, url) = (name.to_string(), url.to_string());
		self.blocking(move |context| {
			let repo = ops::open(context.work_tree(), &[])?;
			config::set(&repo, "submodule", &name, "url", &url)
		})
		.await
	}
}
