// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use loom_git_client_core::refs::matches_pattern;
use loom_git_client_core::urls::{is_url, redact_url};
use loom_git_client_core::{
	active_host_key_verification, BackendContext, BackendKind, CheckoutOptions, CloneOptions,
	CommitInfo, Credentials, FetchOptions, GitBackend, GitError, GitVersion, LogOptions,
	MergeOptions, MergeOutcome, PushOptions, Result, SubmoduleEntry, SubmoduleUpdateOptions,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::askpass::credentials_script;
use crate::process::{Invocation, ProcessOutput};
use crate::scoped::ScopedFiles;
use crate::ssh::{is_ssh_url, ssh_environment};
use crate::submodule::parse_submodule_urls;
use crate::tempdir::credential_dir;

const GIT_SSH_COMMAND_MIN: GitVersion = GitVersion::new(2, 3, 0, 0);
const SUBMODULE_REMOTE_MIN: GitVersion = GitVersion::new(1, 8, 2, 0);
const SUBMODULE_JOBS_MIN: GitVersion = GitVersion::new(2, 9, 0, 0);
const SUBMODULE_DEPTH_MIN: GitVersion = GitVersion::new(2, 10, 0, 0);

/// Field separator for `git log --format`.
const LOG_SEPARATOR: char = '\u{1f}';

/// Refuse a caller-supplied remote, URL or path that git would read as an
/// option.
fn positional(value: &str) -> Result<&str> {
	if value.starts_with('-') {
		return Err(GitError::config(format!(
			"'{value}' looks like an option, not a remote, URL or path"
		)));
	}
	Ok(value)
}

/// Git backend that runs the `git` executable.
pub struct CliGitBackend {
	context: BackendContext,
	executable: String,
	version: OnceCell<GitVersion>,
}

impl CliGitBackend {
	pub fn new(context: BackendContext) -> Self {
		Self {
			context,
			executable: "git".to_string(),
			version: OnceCell::new(),
		}
	}

	pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
		self.executable = executable.into();
		self
	}

	/// The version reported by `git --version`, read once per backend.
	pub async fn version(&self) -> Result<GitVersion> {
		self.version
			.get_or_try_init(|| async {
				let output = self.run(self.git().arg("--version")).await?;
				let version = GitVersion::parse(&output.stdout)
					.ok_or_else(|| GitError::backend(format!("unrecognised git version output: {}", output.stdout.trim())))?;
				debug!(%version, "detected git version");
				Ok::<_, GitError>(version)
			})
			.await
			.copied()
	}

	pub async fn is_at_least(&self, major: u32, minor: u32, revision: u32, build: u32) -> Result<bool> {
		Ok(self.version().await?.is_at_least(major, minor, revision, build))
	}

	async fn require(&self, feature: &'static str, required: GitVersion) -> Result<()> {
		let found = self.version().await?;
		if found >= required {
			Ok(())
		} else {
			warn!(feature, %required, %found, "git too old for requested feature");
			Err(GitError::VersionTooOld {
				feature,
				required,
				found,
			})
		}
	}

	fn git(&self) -> Invocation {
		Invocation::new(&self.executable)
			.current_dir(self.context.work_tree())
			.envs(self.context.env.iter().map(|(k, v)| (k.clone(), v.clone())))
	}

	async fn run(&self, invocation: Invocation) -> Result<ProcessOutput> {
		invocation.run(self.context.sink.as_ref()).await
	}

	/// Run an invocation that may exit 1 to mean "nothing found".
	async fn run_optional(&self, invocation: Invocation) -> Result<Option<ProcessOutput>> {
		match self.run(invocation).await {
			Ok(output) => Ok(Some(output)),
			Err(GitError::CommandFailed { code: Some(1), .. }) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// The URL behind a remote name, or `remote` itself when it already is
	/// a URL or path.
	async fn resolve_remote(&self, remote: &str) -> Result<String> {
		positional(remote)?;
		if is_url(remote) || Path::new(remote).is_absolute() || remote.starts_with('.') {
			return Ok(remote.to_string());
		}
		Ok(self.remote_url(remote).await?.unwrap_or_else(|| remote.to_string()))
	}

	/// Run a command that talks to `url`, with proxy, askpass and ssh
	/// settings in its environment.
	///
	/// Credentials come from the set registered for `credentials_url`. Any
	/// files written for them are released before returning, whatever the
	/// outcome; a release failure is reported only if the command succeeded.
	async fn run_network(&self, url: &str, credentials_url: &str, invocation: Invocation) -> Result<ProcessOutput> {
		let mut scope = ScopedFiles::new(credential_dir(&self.context));
		let credentials = self.context.credentials.for_url(credentials_url);

		let outcome = match self.network_env(&mut scope, url, credentials.as_ref()).await {
			Ok(env) => self.run(invocation.envs(env)).await,
			Err(e) => Err(e),
		};

		let released = scope.release().await;
		let output = outcome?;
		released?;
		Ok(output)
	}

	async fn network_env(
		&self,
		scope: &mut ScopedFiles,
		url: &str,
		credentials: Option<&Credentials>,
	) -> Result<Vec<(String, String)>> {
		let mut env = Vec::new();

		if let Some(proxy) = &self.context.proxy {
			env.extend(proxy.environment());
		}

		if let Some(Credentials::UsernamePassword { username, password }) = credentials {
			let (script, suffix) = credentials_script(username, password.expose());
			let askpass = scope.write_script("askpass-", suffix, &script).await?;
			let askpass = askpass.display().to_string();
			env.push(("GIT_ASKPASS".to_string(), askpass.clone()));
			env.push(("SSH_ASKPASS".to_string(), askpass));
		}

		if is_ssh_url(url) {
			self.require("GIT_SSH_COMMAND", GIT_SSH_COMMAND_MIN).await?;
			let base = self.context.var("GIT_SSH_COMMAND").unwrap_or_else(|| "ssh".to_string());
			let strategy = active_host_key_verification();
			env.extend(ssh_environment(scope, &base, &strategy, credentials).await?);
		} else if matches!(credentials, Some(Credentials::SshKey { .. })) {
			debug!(url = %redact_url(url), "ssh key credentials ignored for non-ssh url");
		}

		Ok(env)
	}

	async fn current_branch(&self) -> Result<Option<String>> {
		Ok(self
			.run_optional(self.git().args(["symbolic-ref", "--quiet", "--short", "HEAD"]))
			.await?
			.map(|o| o.stdout.trim().to_string()))
	}

	async fn parent_count(&self, revision: &str) -> Result<usize> {
		let output = self
			.run(self.git().args(["rev-list", "--parents", "-n", "1", revision]))
			.await?;
		Ok(output.stdout.split_whitespace().count().saturating_sub(1))
	}

	async fn submodule_path(&self, name: &str) -> Result<String> {
		let key = format!("submodule.{name}.path");
		let output = self
			.run_optional(self.git().args(["config", "-f", ".gitmodules", "--get", &key]))
			.await?;
		Ok(output
			.map(|o| o.stdout.trim().to_string())
			.filter(|p| !p.is_empty())
			.unwrap_or_else(|| name.to_string()))
	}
}

#[async_trait]
impl GitBackend for CliGitBackend {
	fn kind(&self) -> BackendKind {
		BackendKind::Cli
	}

	fn context(&self) -> &BackendContext {
		&self.context
	}

	async fn init(&self) -> Result<()> {
		tokio::fs::create_dir_all(self.context.work_tree()).await?;
		self.run(self.git().arg("init")).await?;
		Ok(())
	}

	async fn has_repository(&self) -> bool {
		if !self.context.work_tree().join(".git").exists() {
			return false;
		}
		self.run(self.git().args(["rev-parse", "--git-dir"])).await.is_ok()
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn clone_repository(&self, options: &CloneOptions) -> Result<()> {
		let url = options.url()?;
		tokio::fs::create_dir_all(self.context.work_tree()).await?;

		let mut invocation = self
			.git()
			.args(["clone", "--origin", options.remote_name()])
			.timeout(options.timeout);
		if let Some(depth) = options.effective_depth() {
			invocation = invocation.arg("--depth").arg(depth.to_string());
		}
		if options.no_checkout {
			invocation = invocation.arg("--no-checkout");
		}
		if options.no_tags {
			invocation = invocation.arg("--no-tags");
		}
		if let Some(reference) = &options.reference {
			if reference.join(".git").is_dir() || reference.join("objects").is_dir() {
				invocation = invocation.arg("--reference").arg(reference.display().to_string());
			} else {
				warn!(reference = %reference.display(), "reference repository not found, cloning without it");
			}
		}
		invocation = invocation.arg("--").arg(url).arg(".");

		self.run_network(url, url, invocation).await?;

		if !options.refspecs.is_empty() {
			let key = format!("remote.{}.fetch", options.remote_name());
			self.run(self.git().args(["config", "--unset-all", &key])).await?;
			for refspec in &options.refspecs {
				self.run(self.git().args(["config", "--add", &key, refspec])).await?;
			}
		}

		info!(url = %redact_url(url), "cloned repository");
		Ok(())
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn fetch(&self, options: &FetchOptions) -> Result<()> {
		let remote = options.remote()?;
		let url = self.resolve_remote(remote).await?;

		let mut invocation = self.git().arg("fetch").timeout(options.timeout);
		if options.prune {
			invocation = invocation.arg("--prune");
		}
		if let Some(depth) = options.effective_depth() {
			invocation = invocation.arg("--depth").arg(depth.to_string());
		}
		if options.no_tags {
			invocation = invocation.arg("--no-tags");
		}
		invocation = invocation.arg("--").arg(remote).args(options.refspecs.iter().cloned());

		self.run_network(&url, &url, invocation).await?;
		Ok(())
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn checkout(&self, options: &CheckoutOptions) -> Result<()> {
		let reference = options.reference()?;

		let mut invocation = self.git().arg("checkout").timeout(options.timeout);
		if options.force {
			invocation = invocation.arg("-f");
		}

		match &options.branch {
			Some(branch) => {
				if options.delete_branch_if_exists
					&& self.current_branch().await?.as_deref() != Some(branch.as_str())
					&& self.rev_parse(&format!("refs/heads/{branch}")).await?.is_some()
				{
					self.run(self.git().args(["branch", "-D", branch.as_str()])).await?;
				}
				invocation = invocation.arg("-B").arg(branch.as_str()).arg(reference);
			}
			None => {
				invocation = invocation.arg(reference);
			}
		}

		self.run(invocation.arg("--")).await?;
		Ok(())
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn merge(&self, options: &MergeOptions) -> Result<MergeOutcome> {
		let revision = options.revision()?;
		let before = self.rev_parse("HEAD").await?;

		let mut invocation = self
			.git()
			.arg("merge")
			.args(options.strategy.git_args().iter().copied())
			.arg(options.fast_forward.git_arg());
		if options.squash {
			invocation = invocation.arg("--squash");
		}
		if !options.commit {
			invocation = invocation.arg("--no-commit");
		}
		if !options.squash && options.commit {
			invocation = invocation.arg("-m").arg(options.message_or_default());
		}
		invocation = invocation.arg(revision);

		if let Err(err) = self.run(invocation).await {
			let unmerged = self.run(self.git().args(["ls-files", "--unmerged"])).await;
			if matches!(&unmerged, Ok(o) if !o.stdout.trim().is_empty()) {
				return Err(GitError::MergeConflict {
					revision: revision.to_string(),
				});
			}
			return Err(err);
		}

		let after = self.rev_parse("HEAD").await?;
		let outcome = match after {
			Some(head) if before.as_deref() != Some(head.as_str()) => {
				if self.parent_count(&head).await? > 1 {
					MergeOutcome::Merged { head }
				} else {
					MergeOutcome::FastForward { head }
				}
			}
			_ if options.squash || !options.commit => {
				let staged = self.run(self.git().args(["diff", "--cached", "--name-only"])).await?;
				if staged.stdout.trim().is_empty() {
					MergeOutcome::AlreadyUpToDate
				} else {
					MergeOutcome::Uncommitted
				}
			}
			_ => MergeOutcome::AlreadyUpToDate,
		};
		debug!(?outcome, revision, "merge finished");
		Ok(outcome)
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn push(&self, options: &PushOptions) -> Result<()> {
		let remote = options.remote()?;
		let url = self.resolve_remote(remote).await?;

		let mut invocation = self.git().arg("push").timeout(options.timeout);
		if options.force {
			invocation = invocation.arg("--force");
		}
		if options.tags {
			invocation = invocation.arg("--tags");
		}
		invocation = invocation.arg("--").arg(remote).arg(options.refspec()?);

		self.run_network(&url, &url, invocation).await?;
		Ok(())
	}

	#[instrument(skip_all, fields(work_tree = %self.context.work_tree().display()))]
	async fn submodule_update(&self, options: &SubmoduleUpdateOptions) -> Result<()> {
		if options.remote_tracking {
			self.require("submodule update --remote", SUBMODULE_REMOTE_MIN).await?;
		}
		if options.effective_depth().is_some() {
			self.require("submodule update --depth", SUBMODULE_DEPTH_MIN).await?;
		}
		if options.threads.is_some() {
			self.require("submodule update --jobs", SUBMODULE_JOBS_MIN).await?;
		}

		self.run(self.git().args(["submodule", "init"])).await?;
		let parent_url = match self.remote_names().await?.first() {
			Some(name) => self.remote_url(name).await?,
			None => None,
		};

		for entry in self.submodule_urls().await? {
			let path = self.submodule_path(&entry.name).await?;
			let mut invocation = self
				.git()
				.args(["submodule", "update", "--init"])
				.timeout(options.timeout);
			if options.recursive {
				invocation = invocation.arg("--recursive");
			}
			if options.remote_tracking {
				invocation = invocation.arg("--remote");
			}
			if let Some(reference) = &options.reference {
				invocation = invocation.arg("--reference").arg(reference.display().to_string());
			}
			if let Some(depth) = options.effective_depth() {
				invocation = invocation.arg("--depth").arg(depth.to_string());
			}
			if let Some(threads) = options.threads {
				invocation = invocation.arg("--jobs").arg(threads.to_string());
			}
			invocation = invocation.arg("--").arg(path);

			let credentials_url = match (&parent_url, options.parent_credentials) {
				(Some(parent), true) => parent.as_str(),
				_ => entry.url.as_str(),
			};
			self.run_network(&entry.url, credentials_url, invocation).await?;
		}
		Ok(())
	}

	async fn log(&self, options: &LogOptions) -> Result<Vec<CommitInfo>> {
		let mut invocation = self
			.git()
			.arg("log")
			.arg("--format=%H%x1f%an%x1f%ae%x1f%ct%x1f%s");
		if let Some(count) = options.max_count {
			invocation = invocation.arg(format!("--max-count={count}"));
		}
		let range = options.range.as_deref().unwrap_or("HEAD");
		let output = self.run(invocation.arg(range).arg("--")).await?;

		Ok(output
			.stdout
			.lines()
			.filter_map(|line| {
				let mut fields = line.splitn(5, LOG_SEPARATOR);
				Some(CommitInfo {
					sha: fields.next()?.to_string(),
					author_name: fields.next()?.to_string(),
					author_email: fields.next()?.to_string(),
					timestamp: fields.next()?.parse().ok()?,
					summary: fields.next().unwrap_or_default().to_string(),
				})
			})
			.collect())
	}

	async fn rev_parse(&self, revision: &str) -> Result<Option<String>> {
		let spec = format!("{revision}^{{commit}}");
		match self.run(self.git().args(["rev-parse", "--verify", "--quiet", &spec])).await {
			Ok(output) => Ok(Some(output.stdout.trim().to_string())),
			Err(GitError::CommandFailed { code: Some(1), .. }) => Ok(None),
			Err(e) => Err(e),
		}
	}

	async fn tag(&self, name: &str, message: Option<&str>) -> Result<()> {
		let invocation = match message {
			Some(message) => self.git().args(["tag", "-a", "-m", message, "--", name]),
			None => self.git().args(["tag", "--", name]),
		};
		self.run(invocation).await?;
		Ok(())
	}

	async fn tag_names(&self, pattern: Option<&str>) -> Result<Vec<String>> {
		let output = self.run(self.git().args(["tag", "-l"])).await?;
		Ok(output
			.stdout
			.lines()
			.map(str::trim)
			.filter(|t| !t.is_empty())
			.filter(|t| pattern.map_or(true, |p| matches_pattern(t, p)))
			.map(str::to_string)
			.collect())
	}

	async fn remote_names(&self) -> Result<Vec<String>> {
		let output = self.run(self.git().arg("remote")).await?;
		Ok(output
			.stdout
			.lines()
			.map(str::trim)
			.filter(|r| !r.is_empty())
			.map(str::to_string)
			.collect())
	}

	async fn remote_url(&self, remote: &str) -> Result<Option<String>> {
		let key = format!("remote.{remote}.url");
		Ok(self
			.run_optional(self.git().args(["config", "--get", &key]))
			.await?
			.map(|o| o.stdout.trim().to_string()))
	}

	async fn set_remote_url(&self, remote: &str, url: &str) -> Result<()> {
		let key = format!("remote.{remote}.url");
		self.run(self.git().args(["config", "--", &key, positional(url)?])).await?;
		Ok(())
	}

	async fn add_remote(&self, remote: &str, url: &str) -> Result<()> {
		self.run(self.git().args(["remote", "add", "--", positional(remote)?, positional(url)?]))
			.await?;
		Ok(())
	}

	async fn remote_references(
		&self,
		url: &str,
		pattern: Option<&str>,
		heads: bool,
		tags: bool,
	) -> Result<BTreeMap<String, String>> {
		let resolved = self.resolve_remote(url).await?;
		let mut invocation = self.git().arg("ls-remote");
		if heads {
			invocation = invocation.arg("--heads");
		}
		if tags {
			invocation = invocation.arg("--tags");
		}
		let output = self
			.run_network(&resolved, &resolved, invocation.arg("--").arg(url))
			.await?;

		Ok(output
			.stdout
			.lines()
			.filter_map(|line| line.split_once('\t'))
			.map(|(sha, name)| (name.trim(), sha.trim()))
			.filter(|(name, _)| !name.ends_with("^{}"))
			.filter(|(name, _)| pattern.map_or(true, |p| matches_pattern(name, p)))
			.map(|(name, sha)| (name.to_string(), sha.to_string()))
			.collect())
	}

	async fn prune(&self, remote: &str) -> Result<()> {
		let url = self.resolve_remote(remote).await?;
		self.run_network(&url, &url, self.git().args(["remote", "prune", "--", remote]))
			.await?;
		Ok(())
	}

	async fn add_submodule(&self, url: &str, path: &str) -> Result<()> {
		positional(url)?;
		positional(path)?;
		self.run_network(url, url, self.git().args(["submodule", "add", "--", url, path]))
			.await?;
		Ok(())
	}

	async fn submodule_urls(&self) -> Result<Vec<SubmoduleEntry>> {
		let output = self
			.run_optional(self.git().args(["config", "--get-regexp", r"^submodule\..*\.url$"]))
			.await?;
		Ok(output.map(|o| parse_submodule_urls(&o.stdout)).unwrap_or_default())
	}

	async fn set_submodule_url(&self, name: &str, url: &str) -> Result<()> {
		let key = format!("submodule.{name}.url");
		self.run(self.git().args(["config", &key, url])).await?;
		Ok(())
	}
}
