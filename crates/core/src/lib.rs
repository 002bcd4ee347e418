// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! scribe-core: shared types for the Scribe hook pipeline

pub mod clock;
pub mod debug_log;
pub mod digest;
pub mod envcfg;
pub mod envelope;
pub mod id;
pub mod outcome;
pub mod paths;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use debug_log::DebugLog;
pub use digest::{Digest, DigestKind, FileRef, OutcomeStatus, QualityGate, Stage};
pub use envelope::{EnvelopeError, HookEvent};
pub use id::{checkpoint_id, ingest_job_id, retry_suffix};
pub use outcome::HookOutcome;
pub use paths::Paths;
pub use time_fmt::{archive_stamp, iso_now, parse_flexible, stamp_now};
