// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working Set Index: a bounded, ordered list of recently touched files.
//!
//! Uniqueness is by path with newer entries winning in place; overflow
//! drops the oldest. The file is rewritten whole on every refresh.

use std::io;
use std::path::{Path, PathBuf};

use scribe_core::{time_fmt, Digest};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsiItem {
    pub path: String,
    pub reason: String,
    #[serde(default)]
    pub anchors: Vec<String>,
    pub last_access: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wsi {
    #[serde(default)]
    pub items: Vec<WsiItem>,
}

#[derive(Debug, Clone)]
pub struct WsiFile {
    path: PathBuf,
    cap: usize,
}

impl WsiFile {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap: cap.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Wsi {
        std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, wsi: &Wsi) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = serde_json::to_string_pretty(wsi).map_err(io::Error::other)?;
        text.push('\n');
        std::fs::write(&self.path, text)
    }

    /// Write an empty index when the file is missing.
    pub fn ensure(&self) -> io::Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&Wsi::default())
    }

    /// Merge the digest's files (and any RAG-suggested paths) into the
    /// index: dedupe by path keeping the newest record, append suggestions
    /// only when their path is absent, then cap to the newest entries.
    pub fn refresh(&self, digest: &Digest, suggestions: &[String]) -> io::Result<Wsi> {
        let mut wsi = self.load();
        let timestamp = time_fmt::iso_now();

        for file in &digest.files {
            if file.path.is_empty() {
                continue;
            }
            let item = WsiItem {
                path: file.path.clone(),
                reason: if file.reason.is_empty() {
                    "touched".to_string()
                } else {
                    file.reason.clone()
                },
                anchors: file.anchors.clone(),
                last_access: timestamp.clone(),
            };
            match wsi.items.iter_mut().find(|i| i.path == item.path) {
                Some(existing) => *existing = item,
                None => wsi.items.push(item),
            }
        }

        for path in suggestions {
            if path.is_empty() || wsi.items.iter().any(|i| &i.path == path) {
                continue;
            }
            wsi.items.push(WsiItem {
                path: path.clone(),
                reason: "rag-suggest".to_string(),
                anchors: Vec::new(),
                last_access: timestamp.clone(),
            });
        }

        if wsi.items.len() > self.cap {
            wsi.items.drain(..wsi.items.len() - self.cap);
        }
        self.save(&wsi)?;
        Ok(wsi)
    }

    /// Archive overflow beyond the cap and truncate the live index.
    /// Returns the archive path when pruning happened.
    pub fn prune_with_archive(&self, archive_dir: &Path) -> io::Result<Option<PathBuf>> {
        let mut wsi = self.load();
        if wsi.items.len() <= self.cap {
            return Ok(None);
        }

        let overflow: Vec<WsiItem> = wsi.items.drain(..wsi.items.len() - self.cap).collect();
        std::fs::create_dir_all(archive_dir)?;
        let archive_path =
            archive_dir.join(format!("wsi-archive-{}.json", time_fmt::archive_stamp()));
        let record = serde_json::json!({
            "archived": overflow,
            "timestamp": time_fmt::iso_now(),
        });
        let mut text = serde_json::to_string_pretty(&record).map_err(io::Error::other)?;
        text.push('\n');
        std::fs::write(&archive_path, text)?;

        self.save(&wsi)?;
        Ok(Some(archive_path))
    }
}

#[cfg(test)]
#[path = "wsi_tests.rs"]
mod tests;
