// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Id minting for ingest jobs and checkpoints.

use chrono::Local;
use nanoid::nanoid;

const HEX: [char; 16] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
];

/// Mint an ingest job id: `<ms_epoch>-<8hex>`.
pub fn ingest_job_id(epoch_ms: u64) -> String {
    format!("{}-{}", epoch_ms, nanoid!(8, &HEX))
}

/// Mint a checkpoint id from local time, second resolution.
pub fn checkpoint_id() -> String {
    Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// Short random suffix used to avoid filename collisions on retry.
pub fn retry_suffix() -> String {
    nanoid!(6, &HEX)
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
