//! Processor registry and section dispatch.

use crate::context::ProcessContext;
use crate::error::{ProcessorError, ProcessorErrorKind};
use crate::Result;
use floret_config::ConfigNode;
use std::collections::BTreeMap;
use tracing::debug;

/// Handles all sections of one scheme.
pub trait Processor: Send + Sync {
    /// The scheme this processor owns, e.g. "env".
    fn scheme(&self) -> &str;

    /// Process one enabled top-level section.
    fn process(
        &self,
        config: &ConfigNode,
        section_key: &str,
        ctx: &mut ProcessContext<'_>,
    ) -> Result<()>;
}

/// The scheme of a section key: everything before the first ':', or the
/// whole key when there is none.
pub fn section_scheme(section_key: &str) -> &str {
    match section_key.split_once(':') {
        Some((scheme, _)) => scheme,
        None => section_key,
    }
}

/// What to do when a section fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Stop at the first failure and return it.
    #[default]
    FailFast,
    /// Keep going and report all failures in the outcome.
    CollectAll,
}

/// Summary of one dispatch run.
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// Section keys processed successfully, in dispatch order.
    pub processed: Vec<String>,
    /// Section keys skipped because no processor owns their scheme.
    pub skipped: Vec<String>,
    /// Failures, non-empty only under [`FailureMode::CollectAll`].
    pub failures: Vec<ProcessorError>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Explicit mapping from scheme to processor. Registration order does
/// not matter; dispatch order is fixed by section keys.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: BTreeMap<String, Box<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor, replacing any previous owner of its scheme.
    pub fn register(&mut self, processor: Box<dyn Processor>) -> &mut Self {
        self.processors.insert(processor.scheme().to_string(), processor);
        self
    }

    pub fn get(&self, scheme: &str) -> Option<&dyn Processor> {
        self.processors.get(scheme).map(|p| &**p)
    }

    /// Process one named section, failing on an unknown scheme.
    pub fn process_section(
        &self,
        config: &ConfigNode,
        section_key: &str,
        ctx: &mut ProcessContext<'_>,
    ) -> Result<()> {
        let scheme = section_scheme(section_key);
        let processor = self.get(scheme).ok_or_else(|| {
            ProcessorError::new(
                section_key,
                ProcessorErrorKind::UnknownScheme {
                    scheme: scheme.to_string(),
                },
            )
        })?;
        processor.process(config, section_key, ctx)
    }

    /// Dispatch every enabled top-level section to its processor.
    ///
    /// Sections run in ascending lexical order of their keys. Ignored
    /// sections and sections with no registered scheme are skipped, the
    /// latter recorded in the outcome.
    pub fn dispatch(
        &self,
        config: &ConfigNode,
        ctx: &mut ProcessContext<'_>,
        mode: FailureMode,
    ) -> std::result::Result<DispatchOutcome, ProcessorError> {
        let mut keys: Vec<&str> = config
            .children()
            .filter(|(_, node)| !node.is_ignored() && node.as_scalar().is_none())
            .map(|(key, _)| key)
            .collect();
        keys.sort_unstable();

        let mut outcome = DispatchOutcome::default();
        for key in keys {
            let scheme = section_scheme(key);
            let Some(processor) = self.get(scheme) else {
                debug!(section = key, scheme, "no processor, skipping");
                outcome.skipped.push(key.to_string());
                continue;
            };
            match processor.process(config, key, ctx) {
                Ok(()) => outcome.processed.push(key.to_string()),
                Err(err) => match mode {
                    FailureMode::FailFast => return Err(err),
                    FailureMode::CollectAll => outcome.failures.push(err),
                },
            }
        }
        Ok(outcome)
    }
}
