//! Handler trait, ordered registry and the cached fetch entry point.

use crate::{LocError, Location, Result};
use floret_shell::{CommandRunner, Event, EventSink};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Facilities a handler may use while parsing or pulling.
pub struct PullContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub sink: &'a dyn EventSink,
    /// Directory pulls materialise content into.
    pub work_dir: &'a Path,
    /// Deadline for any subprocess a handler starts.
    pub timeout: Option<Duration>,
}

/// A scheme-specific way of resolving locations.
pub trait LocHandler: Send + Sync {
    fn scheme(&self) -> &str;

    /// Whether this handler claims the location.
    fn can_handle(&self, loc: &Location) -> bool;

    /// Fill in `loc_type` and `paths` (the content digests).
    fn parse(&self, loc: &mut Location, ctx: &PullContext<'_>) -> Result<()>;

    /// Materialise the content and set `cache`. Requires a prior parse.
    fn pull(&self, loc: &mut Location, ctx: &PullContext<'_>) -> Result<()>;
}

/// Ordered scan over registered handlers; the first `can_handle` wins.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn LocHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn LocHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn find(&self, loc: &Location) -> Result<&dyn LocHandler> {
        self.handlers
            .iter()
            .map(|h| &**h)
            .find(|h| h.can_handle(loc))
            .ok_or_else(|| LocError::NoHandlerForLocation {
                name: loc.to_string(),
            })
    }
}

/// Parse and, unless the content is already cached, pull a location.
///
/// `prev` is the record of an earlier fetch of the same name. When the
/// freshly parsed digests match `prev` and its cache still exists, the
/// pull is skipped and the old cache is reused.
pub fn fetch(
    registry: &HandlerRegistry,
    loc: &mut Location,
    prev: Option<&Location>,
    ctx: &PullContext<'_>,
) -> Result<()> {
    let handler = registry.find(loc)?;
    handler.parse(loc, ctx)?;

    if let Some(prev) = prev {
        if loc.same_content(prev) {
            if let Some(cache) = prev.cache.as_ref().filter(|c| c.exists()) {
                debug!(loc = %loc, cache = %cache.display(), "content unchanged, reusing cache");
                ctx.sink.event(Event::info(
                    "loc-cache",
                    format!("{loc}: unchanged, cache reused"),
                ));
                loc.cache = Some(cache.clone());
                return Ok(());
            }
        }
    }

    handler.pull(loc, ctx)?;
    ctx.sink
        .event(Event::info("loc-pull", format!("pulled {loc}")));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocType;
    use floret_shell::{CommandOutput, CommandSpec, MemorySink, ShellError};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NoRunner;

    impl CommandRunner for NoRunner {
        fn run(&self, spec: &CommandSpec) -> std::result::Result<CommandOutput, ShellError> {
            Err(ShellError::Spawn {
                program: spec.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Unsupported, "no commands in test"),
            })
        }
    }

    /// Claims everything with its scheme; counts pulls.
    struct CountingHandler {
        scheme: &'static str,
        pulls: Arc<AtomicUsize>,
        cache: PathBuf,
    }

    impl LocHandler for CountingHandler {
        fn scheme(&self) -> &str {
            self.scheme
        }

        fn can_handle(&self, loc: &Location) -> bool {
            loc.scheme.as_deref() == Some(self.scheme)
        }

        fn parse(&self, loc: &mut Location, _ctx: &PullContext<'_>) -> Result<()> {
            loc.loc_type = Some(LocType::Blob);
            loc.paths = vec![(String::new(), Some("fixed".to_string()))];
            Ok(())
        }

        fn pull(&self, loc: &mut Location, _ctx: &PullContext<'_>) -> Result<()> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            loc.cache = Some(self.cache.clone());
            Ok(())
        }
    }

    fn ctx<'a>(
        runner: &'a dyn CommandRunner,
        sink: &'a dyn EventSink,
        work_dir: &'a Path,
    ) -> PullContext<'a> {
        PullContext {
            runner,
            sink,
            work_dir,
            timeout: None,
        }
    }

    #[test]
    fn first_claiming_handler_wins() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Box::new(CountingHandler {
            scheme: "a",
            pulls: pulls.clone(),
            cache: PathBuf::from("/cache/a"),
        }));
        registry.register(Box::new(CountingHandler {
            scheme: "b",
            pulls: pulls.clone(),
            cache: PathBuf::from("/cache/b"),
        }));
        let loc = Location::parse_id("b:thing");
        assert_eq!(registry.find(&loc).unwrap().scheme(), "b");
    }

    #[test]
    fn unclaimed_location_is_an_error() {
        let registry = HandlerRegistry::new();
        let loc = Location::parse_id("svn:x");
        assert!(matches!(
            registry.find(&loc),
            Err(LocError::NoHandlerForLocation { .. })
        ));
    }

    #[test]
    fn fetch_skips_pull_when_digests_and_cache_survive() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cached");
        std::fs::write(&cache, b"content").unwrap();
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Box::new(CountingHandler {
            scheme: "fs",
            pulls: pulls.clone(),
            cache: cache.clone(),
        }));
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());

        let mut first = Location::parse_id("thing");
        fetch(&registry, &mut first, None, &ctx).unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 1);

        let mut second = Location::parse_id("thing");
        fetch(&registry, &mut second, Some(&first), &ctx).unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
        assert_eq!(second.cache.as_deref(), Some(cache.as_path()));
    }

    #[test]
    fn fetch_repulls_when_cache_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let pulls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(Box::new(CountingHandler {
            scheme: "fs",
            pulls: pulls.clone(),
            cache: dir.path().join("vanished"),
        }));
        let runner = NoRunner;
        let sink = MemorySink::new();
        let ctx = ctx(&runner, &sink, dir.path());

        let mut first = Location::parse_id("thing");
        fetch(&registry, &mut first, None, &ctx).unwrap();
        let mut second = Location::parse_id("thing");
        fetch(&registry, &mut second, Some(&first), &ctx).unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
    }
}
