// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scribe-adapters: external collaborators behind explicit seams.
//!
//! The pipeline talks to three kinds of children: the vector memory service
//! (JSON-RPC 2.0 over stdio), git, and the project's typecheck tooling.
//! Every invocation carries a wall-clock budget and is killed on expiry.

pub mod git;
pub mod subprocess;
pub mod typecheck;
pub mod vector;

pub use git::Git;
pub use subprocess::run_with_timeout;
pub use typecheck::TypecheckOutcome;
pub use vector::{IngestOutcome, MemoryService, VectorClient};
