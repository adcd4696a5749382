//! Local filesystem handler.

use crate::registry::{LocHandler, PullContext};
use crate::{content_digest, LocError, LocType, Location, Result};
use std::path::Path;

/// Handles `fs:` locations (and bare paths, which default to fs).
///
/// Content already lives on the local disk, so `pull` just points the
/// cache at the source path.
#[derive(Debug, Clone, Default)]
pub struct FsHandler;

impl FsHandler {
    pub fn new() -> Self {
        FsHandler
    }
}

impl LocHandler for FsHandler {
    fn scheme(&self) -> &str {
        "fs"
    }

    fn can_handle(&self, loc: &Location) -> bool {
        matches!(loc.scheme.as_deref(), Some("fs") | None)
    }

    fn parse(&self, loc: &mut Location, _ctx: &PullContext<'_>) -> Result<()> {
        let path = Path::new(&loc.name);
        let meta = path
            .symlink_metadata()
            .map_err(|_| LocError::not_found(&loc.name))?;
        loc.loc_type = Some(if meta.is_dir() {
            LocType::Tree
        } else {
            LocType::Blob
        });
        loc.paths = content_digest(path)?;
        loc.scheme = Some("fs".to_string());
        Ok(())
    }

    fn pull(&self, loc: &mut Location, _ctx: &PullContext<'_>) -> Result<()> {
        if !loc.is_parsed() {
            return Err(LocError::NotParsed {
                name: loc.to_string(),
            });
        }
        let path = Path::new(&loc.name);
        // The source may have vanished between parse and pull.
        if !path.exists() {
            return Err(LocError::not_found(&loc.name));
        }
        loc.cache = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floret_shell::{CommandOutput, CommandRunner, CommandSpec, MemorySink, ShellError};
    use std::fs;
    use std::path::PathBuf;

    struct NoRunner;

    impl CommandRunner for NoRunner {
        fn run(&self, spec: &CommandSpec) -> std::result::Result<CommandOutput, ShellError> {
            Err(ShellError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Unsupported, "no commands in test"),
            })
        }
    }

    fn ctx<'a>(
        runner: &'a dyn CommandRunner,
        sink: &'a MemorySink,
        work_dir: &'a std::path::Path,
    ) -> PullContext<'a> {
        PullContext {
            runner,
            sink,
            work_dir,
            timeout: None,
        }
    }

    #[test]
    fn parse_then_pull_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, b"payload").unwrap();
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());

        let mut loc = Location::parse_id(&file.display().to_string());
        let handler = FsHandler::new();
        assert!(handler.can_handle(&loc));
        handler.parse(&mut loc, &ctx).unwrap();
        assert_eq!(loc.loc_type, Some(LocType::Blob));
        assert_eq!(loc.paths.len(), 1);
        handler.pull(&mut loc, &ctx).unwrap();
        assert_eq!(loc.cache, Some(file));
    }

    #[test]
    fn parse_directory_as_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"1").unwrap();
        fs::write(dir.path().join("b"), b"2").unwrap();
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());

        let mut loc = Location::parse_id(&dir.path().display().to_string());
        FsHandler::new().parse(&mut loc, &ctx).unwrap();
        assert_eq!(loc.loc_type, Some(LocType::Tree));
        assert_eq!(loc.paths.len(), 2);
    }

    #[test]
    fn pull_before_parse_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());
        let mut loc = Location::parse_id("/tmp/whatever");
        let err = FsHandler::new().pull(&mut loc, &ctx).unwrap_err();
        assert!(matches!(err, LocError::NotParsed { .. }));
        assert!(loc.cache.is_none());
    }

    #[test]
    fn pull_of_vanished_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gone");
        fs::write(&file, b"x").unwrap();
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());
        let mut loc = Location::parse_id(&file.display().to_string());
        let handler = FsHandler::new();
        handler.parse(&mut loc, &ctx).unwrap();
        fs::remove_file(&file).unwrap();
        let err = handler.pull(&mut loc, &ctx).unwrap_err();
        assert!(matches!(err, LocError::NotFound { .. }));
        assert_eq!(loc.cache, None::<PathBuf>);
    }
}
