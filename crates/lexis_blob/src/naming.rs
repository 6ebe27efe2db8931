//! File name sanitizing and the collision candidate sequence.

use std::path::Path;
use tracing::debug;

use crate::error::{BlobError, Result};

/// Base name used when sanitizing leaves nothing.
pub const FALLBACK_BASE: &str = "file";

/// Upper bound on candidates tried for one base name.
pub const MAX_CANDIDATES: u32 = 100_000;

/// Turn a free-form label into a safe file base name.
///
/// Lowercases, maps spaces to `-`, keeps only `[a-z0-9_-]` and collapses runs
/// of `-`.
pub fn sanitize_basename(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.trim().to_lowercase().chars() {
        let ch = if ch == ' ' { '-' } else { ch };
        let keep = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-';
        if !keep || (ch == '-' && out.ends_with('-')) {
            continue;
        }
        out.push(ch);
    }
    if out.is_empty() {
        FALLBACK_BASE.to_string()
    } else {
        out
    }
}

/// The `n`th name in the collision sequence: `base.ext`, `base-1.ext`, ...
pub fn candidate(base: &str, ext: &str, n: u32) -> String {
    if n == 0 {
        format!("{base}{ext}")
    } else {
        format!("{base}-{n}{ext}")
    }
}

/// First name in the collision sequence that does not exist in `dir`.
///
/// Advisory only: another writer may take the name before it is used.
/// [`crate::BlobStore`] claims names with a no-clobber rename instead.
pub fn resolve_collision(dir: &Path, base: &str, ext: &str) -> Result<String> {
    next_free(dir, base, ext, 0).map(|(_, name)| name)
}

/// Like [`resolve_collision`], starting at position `from` and returning the
/// position of the free name.
pub(crate) fn next_free(dir: &Path, base: &str, ext: &str, from: u32) -> Result<(u32, String)> {
    for n in from..MAX_CANDIDATES {
        let name = candidate(base, ext, n);
        if !dir.join(&name).exists() {
            return Ok((n, name));
        }
        debug!(name = %name, "Name taken, trying next candidate");
    }
    Err(BlobError::NamesExhausted {
        base: base.to_string(),
        ext: ext.to_string(),
        attempts: MAX_CANDIDATES,
    })
}
