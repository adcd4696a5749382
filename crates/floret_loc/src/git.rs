//! Git handler, shelling out to the `git` client.

use crate::registry::{LocHandler, PullContext};
use crate::{LocError, LocType, Location, Result};
use floret_shell::{CommandSpec, ShellError};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Handles `git:` locations naming a remote repository.
///
/// `parse` runs `git ls-remote` and digests the HEAD commit hash, so an
/// unmoved branch never forces a re-clone. `pull` makes a shallow clone
/// into a temporary directory inside the work dir, strips the `.git`
/// metadata and renames the result into place only on success.
#[derive(Debug, Clone, Default)]
pub struct GitHandler;

impl GitHandler {
    pub fn new() -> Self {
        GitHandler
    }

    fn head_commit(&self, loc: &Location, ctx: &PullContext<'_>) -> Result<String> {
        let mut spec = CommandSpec::new("git")
            .args(["ls-remote", "--exit-code"])
            .arg(&loc.name)
            .arg("HEAD");
        if let Some(timeout) = ctx.timeout {
            spec = spec.timeout(timeout);
        }
        let output = ctx.runner.run(&spec).map_err(|err| map_git_error(loc, err))?;
        let commit = output
            .stdout
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();
        if commit.is_empty() || !commit.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LocError::internal(
                loc.to_string(),
                "git ls-remote output missing commit hash",
            ));
        }
        Ok(commit)
    }
}

impl LocHandler for GitHandler {
    fn scheme(&self) -> &str {
        "git"
    }

    fn can_handle(&self, loc: &Location) -> bool {
        loc.scheme.as_deref() == Some("git")
    }

    fn parse(&self, loc: &mut Location, ctx: &PullContext<'_>) -> Result<()> {
        let commit = self.head_commit(loc, ctx)?;
        // A commit hash pins the content exactly, like an svn revision.
        let digest = blake3::hash(format!("git\n{}\n{commit}", loc.name).as_bytes())
            .to_hex()
            .to_string();
        loc.loc_type = Some(LocType::Tree);
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
            .prefix(".git-clone-")
            .tempdir_in(ctx.work_dir)
            .map_err(|e| LocError::io(loc.to_string(), e))?;
        let clone_to = staging.path().join("clone");

        let mut spec = CommandSpec::new("git")
            .args(["clone", "--quiet", "--depth", "1"])
            .arg(&loc.name)
            .arg(clone_to.display().to_string());
        if let Some(timeout) = ctx.timeout {
            spec = spec.timeout(timeout);
        }
        // Staging dir (and any partial clone) is removed on drop if the
        // command fails before the rename below.
        ctx.runner.run(&spec).map_err(|err| map_git_error(loc, err))?;

        // The cache is a plain tree; repository metadata stays out of it.
        let git_dir = clone_to.join(".git");
        if git_dir.exists() {
            fs::remove_dir_all(&git_dir).map_err(|e| LocError::io(loc.to_string(), e))?;
        }

        let cache = ctx.work_dir.join(cache_dir_name(&loc.name));
        if cache.exists() {
            fs::remove_dir_all(&cache).map_err(|e| LocError::io(loc.to_string(), e))?;
        }
        fs::rename(&clone_to, &cache).map_err(|e| LocError::io(loc.to_string(), e))?;
        debug!(loc = %loc, cache = %cache.display(), "git clone complete");
        loc.cache = Some(cache);
        Ok(())
    }
}

fn cache_dir_name(url: &str) -> PathBuf {
    let digest = blake3::hash(url.as_bytes()).to_hex();
    let tail = url
        .rsplit('/')
        .next()
        .unwrap_or("clone")
        .trim_end_matches(".git");
    PathBuf::from(format!("{}-{tail}", &digest.as_str()[..12]))
}

fn map_git_error(loc: &Location, err: ShellError) -> LocError {
    match &err {
        ShellError::Status { code, .. } if *code == 2 => {
            // ls-remote --exit-code: 2 means the ref does not exist.
            LocError::not_found(loc.to_string())
        }
        ShellError::Status { stderr, .. }
            if stderr.contains("not found")
                || stderr.contains("does not exist")
                || stderr.contains("Could not read from remote repository") =>
        {
            LocError::not_found(loc.to_string())
        }
        _ => LocError::internal_with(loc.to_string(), "git command failed", err),
    }
}
