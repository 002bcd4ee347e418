// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplicate-read detection cache.
//!
//! Keyed by path, each entry records the content hash, the turn of the
//! last read, and how many duplicate attempts have been seen. Entries
//! older than the turn window are dropped on every consultation.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Re-reads within this many turns count as duplicates.
pub const WINDOW_TURNS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub turn: u64,
    #[serde(default)]
    pub duplicate_attempts: u32,
}

/// Outcome of consulting the cache for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadCheck {
    /// Unseen path, or the window lapsed.
    FirstRead,
    /// Seen path with different content; the counter reset.
    Changed,
    /// Same content within the window; carries the attempt number.
    Duplicate(u32),
}

#[derive(Debug, Clone)]
pub struct ReadCache {
    path: PathBuf,
}

impl ReadCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record a read of `file_path` with `content` at `current_turn` and
    /// classify it.
    pub fn check(&self, file_path: &str, content: &[u8], current_turn: u64) -> ReadCheck {
        let mut cache = self.load();
        cache.retain(|_, entry| current_turn.saturating_sub(entry.turn) <= WINDOW_TURNS);

        let hash = content_hash(content);
        let check = match cache.get_mut(file_path) {
            Some(entry) if entry.hash == hash => {
                entry.duplicate_attempts += 1;
                ReadCheck::Duplicate(entry.duplicate_attempts)
            }
            Some(entry) => {
                *entry = CacheEntry {
                    hash,
                    turn: current_turn,
                    duplicate_attempts: 0,
                };
                ReadCheck::Changed
            }
            None => {
                cache.insert(
                    file_path.to_string(),
                    CacheEntry {
                        hash,
                        turn: current_turn,
                        duplicate_attempts: 0,
                    },
                );
                ReadCheck::FirstRead
            }
        };
        let _ = self.save(&cache);
        check
    }

    fn load(&self) -> HashMap<String, CacheEntry> {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn save(&self, cache: &HashMap<String, CacheEntry>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(cache).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, text)
    }
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "read_cache_tests.rs"]
mod tests;
