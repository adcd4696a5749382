//! Content digests for files and trees.

use crate::{LocError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use walkdir::WalkDir;

const READ_BUF_SIZE: usize = 64 * 1024;

/// Digest the content at `path`.
///
/// A file yields a single `("", digest)` entry; a directory yields one
/// entry per regular file keyed by its relative path, with directories
/// listed digest-less so empty ones still count as content. Entries are
/// sorted by relative path. The hash algorithm is an internal detail;
/// callers only ever compare digests for equality.
pub fn content_digest(path: &Path) -> Result<Vec<(String, Option<String>)>> {
    let name = path.display().to_string();
    let meta = path
        .symlink_metadata()
        .map_err(|_| LocError::not_found(&name))?;
    if meta.is_file() || meta.is_symlink() {
        let digest = file_digest(path).map_err(|e| LocError::io(&name, e))?;
        return Ok(vec![(String::new(), Some(digest))]);
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry.map_err(|e| {
            LocError::io(&name, e.into_io_error().unwrap_or_else(io_other))
        })?;
        let rel = entry
            .path()
            .strip_prefix(path)
            .map_err(|e| LocError::internal_with(&name, "path outside tree", e))?
            .to_string_lossy()
            .into_owned();
        if entry.file_type().is_dir() {
            entries.push((rel, None));
        } else {
            let digest = file_digest(entry.path()).map_err(|e| LocError::io(&name, e))?;
            entries.push((rel, Some(digest)));
        }
    }
    entries.sort();
    Ok(entries)
}

fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

fn io_other() -> std::io::Error {
    std::io::Error::other("walk error without io cause")
}
