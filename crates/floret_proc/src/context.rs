//! Shared state handed to processors during a dispatch run.

use crate::env::EnvExport;
use floret_shell::{CommandRunner, EventSink};
use std::collections::BTreeMap;

/// Context for one dispatch run.
///
/// Carries the command-execution and event-reporting capabilities, the
/// source environment used for variable substitution, per-scheme option
/// knobs, and the environment effects accumulated so far. The context is
/// the only channel for processor side effects that later processors may
/// observe.
pub struct ProcessContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub sink: &'a dyn EventSink,
    environ: BTreeMap<String, String>,
    options: BTreeMap<String, BTreeMap<String, String>>,
    env_exports: Vec<EnvExport>,
}

impl<'a> ProcessContext<'a> {
    pub fn new(runner: &'a dyn CommandRunner, sink: &'a dyn EventSink) -> Self {
        ProcessContext {
            runner,
            sink,
            environ: BTreeMap::new(),
            options: BTreeMap::new(),
            env_exports: Vec::new(),
        }
    }

    /// Seed the substitution environment, replacing any previous one.
    pub fn with_environ<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environ = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Set one per-scheme option knob, e.g. ("archive", "threads", "4").
    pub fn with_option(
        mut self,
        scheme: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.options
            .entry(scheme.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Look up a variable in the substitution environment.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.environ.get(name).map(String::as_str)
    }

    /// Look up an option knob for a scheme.
    pub fn option(&self, scheme: &str, key: &str) -> Option<&str> {
        self.options.get(scheme)?.get(key).map(String::as_str)
    }

    /// Record an environment effect produced by a processor.
    pub fn push_env_export(&mut self, export: EnvExport) {
        // Later exports shadow earlier ones for substitution purposes.
        for (name, value) in export.vars() {
            self.environ.insert(name.to_string(), value.to_string());
        }
        self.env_exports.push(export);
    }

    /// Environment effects accumulated during the run, in dispatch order.
    pub fn env_exports(&self) -> &[EnvExport] {
        &self.env_exports
    }
}
