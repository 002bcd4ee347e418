// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DIGEST fence matching.
//!
//! Accepts fences like ```` ```json DIGEST { … } ```` , ```` ```DIGEST { … } ````
//! and ```` ``` json\nDIGEST\n{ … } ````. The body is matched lazily; a
//! malformed JSON body yields "no DIGEST", never an error.

use std::sync::LazyLock;

use regex::Regex;
use scribe_core::Digest;

#[allow(clippy::expect_used)]
static DIGEST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)```[a-zA-Z0-9]*\s*DIGEST\s*(\{.*?\})\s*```")
        .expect("constant regex pattern is valid")
});

/// First DIGEST in the text, if any.
pub fn extract_digest(text: &str) -> Option<Digest> {
    DIGEST_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

/// Every well-formed DIGEST in the text, in document order.
pub fn extract_all_digests(text: &str) -> Vec<Digest> {
    DIGEST_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| serde_json::from_str(m.as_str()).ok())
        .collect()
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
