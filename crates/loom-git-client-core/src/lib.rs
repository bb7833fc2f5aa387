// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Backend-agnostic pieces of the Loom git client: the command model, the
//! [`GitBackend`] contract both backends implement, credentials, host-key
//! policy, reference normalization and process-wide settings.

mod backend;
mod client;
pub mod commands;
mod context;
mod credentials;
mod error;
pub mod escape;
pub mod host_key;
mod mock_backend;
mod proxy;
pub mod refs;
mod secret;
pub mod settings;
mod sink;
pub mod timeout;
mod types;
pub mod urls;
mod version;

pub use backend::GitBackend;
pub use client::GitClient;
pub use commands::{
	CheckoutCommand, CheckoutOptions, CloneCommand, CloneOptions, FastForwardMode, FetchCommand,
	FetchOptions, LogCommand, LogOptions, MergeCommand, MergeOptions, MergeStrategy, PushCommand,
	PushOptions, SubmoduleUpdateCommand, SubmoduleUpdateOptions,
};
pub use context::BackendContext;
pub use credentials::{CredentialLookup, CredentialSet, Credentials, MemoryCredentialLookup};
pub use error::{GitError, Result};
pub use escape::escape_windows_chars_for_unquoted_string;
pub use host_key::{active_host_key_verification, set_host_key_verification, HostKeyVerification};
pub use mock_backend::{MockCall, MockGitBackend};
pub use proxy::ProxyConfig;
pub use refs::normalize_branch_spec;
pub use secret::{SecretString, REDACTED};
pub use settings::{GitSettings, SettingsError};
pub use sink::{BufferSink, LogSink, TracingSink};
pub use types::{BackendKind, CommitInfo, MergeOutcome, SubmoduleEntry};
pub use version::GitVersion;
