// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The NOTES journal: append-only digest entries, capped with archival.
//!
//! Rotation rewrites the journal non-atomically; the archive file is written
//! first, so a crash mid-rewrite loses nothing.

use std::io::Write;
use std::path::PathBuf;

use scribe_codec::{render_entry, split_entries, NOTES_HEADER};
use scribe_core::{time_fmt, Digest, Paths};

/// Entries kept in the live journal after rotation.
pub const MAX_ENTRIES: usize = 20;

/// Bytes of journal tail consulted by the agent-presence gates.
pub const TAIL_WINDOW: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal io: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
    archive_dir: PathBuf,
}

impl Journal {
    pub fn new(paths: &Paths) -> Self {
        Self {
            path: paths.notes_path(),
            archive_dir: paths.notes_archive_dir(),
        }
    }

    pub fn at(path: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Create the journal with its preamble when missing.
    pub fn ensure(&self) -> Result<(), JournalError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, NOTES_HEADER)?;
        Ok(())
    }

    /// Append one digest entry (stamped now) and rotate if over the cap.
    pub fn append_digest(&self, digest: &Digest) -> Result<(), JournalError> {
        self.ensure()?;
        let entry = render_entry(digest, &time_fmt::stamp_now());
        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(entry.as_bytes())?;
        drop(file);
        self.rotate()?;
        Ok(())
    }

    /// Move overflow entries to a timestamped archive file, keeping the last
    /// [`MAX_ENTRIES`]. Returns the archive path when rotation happened.
    pub fn rotate(&self) -> Result<Option<PathBuf>, JournalError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(_) => return Ok(None),
        };
        let entries = split_entries(&text);
        if entries.len() <= MAX_ENTRIES {
            return Ok(None);
        }

        let split_at = entries.len() - MAX_ENTRIES;
        let (overflow, kept) = entries.split_at(split_at);

        std::fs::create_dir_all(&self.archive_dir)?;
        let archive_path = self
            .archive_dir
            .join(format!("notes-{}.md", time_fmt::archive_stamp()));
        let mut archive = String::from("# Archived NOTES\n\n");
        archive.extend(overflow.iter().copied());
        std::fs::write(&archive_path, archive)?;

        let mut live = String::from(NOTES_HEADER);
        live.push('\n');
        live.extend(kept.iter().copied());
        std::fs::write(&self.path, live)?;

        tracing::debug!(archived = overflow.len(), "rotated journal");
        Ok(Some(archive_path))
    }

    /// Full journal text, empty when unreadable.
    pub fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap_or_default()
    }

    /// Entries currently in the journal, oldest first.
    pub fn entries(&self) -> Vec<String> {
        let text = self.read();
        split_entries(&text).into_iter().map(str::to_string).collect()
    }

    /// Whether the journal tail (last [`TAIL_WINDOW`] bytes) contains the
    /// needle. Used by the schema-change and dependency-removal gates to
    /// check for recent specialist-agent activity.
    pub fn tail_contains(&self, needle: &str) -> bool {
        let text = self.read();
        let bytes = text.as_bytes();
        let start = bytes.len().saturating_sub(TAIL_WINDOW);
        String::from_utf8_lossy(&bytes[start..]).contains(needle)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
