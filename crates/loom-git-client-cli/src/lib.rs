// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Git backend that shells out to the `git` executable.
//!
//! Every invocation is logged with its redacted command line and timeout,
//! killed at its deadline, and given credentials only through files that
//! are deleted when the command finishes.

pub mod askpass;
mod client;
pub mod process;
pub mod scoped;
pub mod ssh;
pub mod submodule;
pub mod tempdir;

pub use client::CliGitBackend;
pub use process::{Arg, Invocation, ProcessOutput};
pub use scoped::ScopedFiles;
