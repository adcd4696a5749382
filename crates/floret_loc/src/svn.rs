//! Subversion handler, shelling out to the `svn` client.

use crate::registry::{LocHandler, PullContext};
use crate::{LocError, LocType, Location, Result};
use floret_shell::{CommandSpec, ShellError};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Handles `svn:` locations.
///
/// `parse` runs `svn info` and digests the node kind and last changed
/// revision, so an unchanged repository path never forces a re-export.
/// `pull` runs `svn export` into a temporary directory inside the work
/// dir and renames the result into place only on success; a failed or
/// timed-out export leaves no partial cache.
#[derive(Debug, Clone, Default)]
pub struct SvnHandler;

impl SvnHandler {
    pub fn new() -> Self {
        SvnHandler
    }

    fn info(&self, loc: &Location, ctx: &PullContext<'_>) -> Result<(LocType, String)> {
        let mut spec = CommandSpec::new("svn")
            .args(["info", "--non-interactive"])
            .arg(&loc.name);
        if let Some(timeout) = ctx.timeout {
            spec = spec.timeout(timeout);
        }
        let output = ctx.runner.run(&spec).map_err(|err| map_svn_error(loc, err))?;

        let mut kind = None;
        let mut revision = None;
        for line in output.stdout.lines() {
            if let Some(value) = line.strip_prefix("Node Kind:") {
                kind = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("Last Changed Rev:") {
                revision = Some(value.trim().to_string());
            }
        }
        let (Some(kind), Some(revision)) = (kind, revision) else {
            return Err(LocError::internal(
                loc.to_string(),
                "svn info output missing node kind or revision",
            ));
        };
        let loc_type = match kind.as_str() {
            "file" => LocType::Blob,
            _ => LocType::Tree,
        };
        Ok((loc_type, revision))
    }
}

impl LocHandler for SvnHandler {
    fn scheme(&self) -> &str {
        "svn"
    }

    fn can_handle(&self, loc: &Location) -> bool {
        loc.scheme.as_deref() == Some("svn")
    }

    fn parse(&self, loc: &mut Location, ctx: &PullContext<'_>) -> Result<()> {
        let (loc_type, revision) = self.info(loc, ctx)?;
        // The digest is over the repository coordinates, not the bytes;
        // svn revisions are immutable so this identifies the content.
        let digest = blake3::hash(format!("svn\n{}\n{revision}", loc.name).as_bytes())
            .to_hex()
            .to_string();
        loc.loc_type = Some(loc_type);
        loc.paths = vec![(String::new(), Some(digest))];
        Ok(())
    }

    fn pull(&self, loc: &mut Location, ctx: &PullContext<'_>) -> Result<()> {
        if !loc.is_parsed() {
            return Err(LocError::NotParsed {
                name: loc.to_string(),
            });
        }
        let staging = tempfile::Builder::new()
            .prefix(".svn-export-")
            .tempdir_in(ctx.work_dir)
            .map_err(|e| LocError::io(loc.to_string(), e))?;
        let export_to = staging.path().join("export");

        let mut spec = CommandSpec::new("svn")
            .args(["export", "--non-interactive", "--quiet"])
            .arg(&loc.name)
            .arg(export_to.display().to_string());
        if let Some(timeout) = ctx.timeout {
            spec = spec.timeout(timeout);
        }
        // Staging dir (and any partial export) is removed on drop if
        // the command fails before the rename below.
        ctx.runner.run(&spec).map_err(|err| map_svn_error(loc, err))?;

        let cache = ctx.work_dir.join(cache_file_name(&loc.name));
        if cache.exists() {
            remove_path(&cache).map_err(|e| LocError::io(loc.to_string(), e))?;
        }
        fs::rename(&export_to, &cache).map_err(|e| LocError::io(loc.to_string(), e))?;
        debug!(loc = %loc, cache = %cache.display(), "svn export complete");
        loc.cache = Some(cache);
        Ok(())
    }
}

fn cache_file_name(url: &str) -> PathBuf {
    let digest = blake3::hash(url.as_bytes()).to_hex();
    let tail = url.rsplit('/').next().unwrap_or("export");
    PathBuf::from(format!("{}-{tail}", &digest.as_str()[..12]))
}

fn remove_path(path: &std::path::Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

fn map_svn_error(loc: &Location, err: ShellError) -> LocError {
    match &err {
        ShellError::Status { stderr, .. }
            if stderr.contains("E170000")
                || stderr.contains("W170000")
                || stderr.contains("non-existent") =>
        {
            LocError::not_found(loc.to_string())
        }
        _ => LocError::internal_with(loc.to_string(), "svn command failed", err),
    }
}
