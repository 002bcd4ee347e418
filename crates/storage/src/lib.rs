// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scribe-storage: durable state under the project's `.claude` directory.
//!
//! Every shared mutable resource in the pipeline is a file here: the NOTES
//! journal, the working set index, the ingestion queue, the approval store,
//! the turn counter, the read-hash cache, checkpoint records and the
//! warnings log. Writes are whole-file (or append-only) so concurrent hook
//! invocations degrade to last-writer-wins rather than corruption.

pub mod approvals;
pub mod checkpoints;
pub mod counter;
pub mod journal;
pub mod queue;
pub mod read_cache;
pub mod warnings;
pub mod wsi;

pub use approvals::{Approval, ApprovalStore};
pub use checkpoints::{CheckpointRecord, CheckpointStore};
pub use counter::TurnCounter;
pub use journal::Journal;
pub use queue::{IngestJob, JobStatus, Queue, QueueConfig, QueueError};
pub use read_cache::{ReadCache, ReadCheck};
pub use warnings::WarningsLog;
pub use wsi::{Wsi, WsiFile, WsiItem};
