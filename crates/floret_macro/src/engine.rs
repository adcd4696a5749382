//! Validator and transformer execution.

use crate::args::MacroArgs;
use crate::error::MacroError;
use crate::report::Report;
use crate::Result;
use floret_config::ConfigNode;
use tracing::debug;

/// A macro that inspects a configuration without mutating it.
///
/// By contract the configuration is read-only during validation; the
/// engine hands each validator a shared reference so the contract is
/// enforced by the type system.
pub trait Validator {
    fn name(&self) -> &str;

    /// Names of the optional keyword parameters this macro declares.
    fn parameters(&self) -> &[&str] {
        &[]
    }

    fn validate(
        &self,
        config: &ConfigNode,
        meta: &ConfigNode,
        args: &MacroArgs,
    ) -> Result<Vec<Report>>;
}

/// A macro that mutates a configuration in place and reports changes.
pub trait Transformer {
    fn name(&self) -> &str;

    fn parameters(&self) -> &[&str] {
        &[]
    }

    fn transform(
        &self,
        config: &mut ConfigNode,
        meta: &ConfigNode,
        args: &MacroArgs,
    ) -> Result<Vec<Report>>;
}

/// Runs pre-resolved macro instances against a configuration.
///
/// The engine performs no plugin discovery; instances are registered at
/// startup. Each run gets a fresh report collection and reports are
/// tagged with the producing macro's name.
#[derive(Default)]
pub struct MacroEngine {
    validators: Vec<Box<dyn Validator>>,
    transformers: Vec<Box<dyn Transformer>>,
}

impl MacroEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn add_transformer(&mut self, transformer: Box<dyn Transformer>) {
        self.transformers.push(transformer);
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn transformer_names(&self) -> Vec<&str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Run every registered validator against `config`.
    ///
    /// Each validator receives only the parameters it declares. A
    /// supplied parameter declared by no validator in the run fails with
    /// [`MacroError::UnsupportedArgument`] before anything executes.
    pub fn validate(
        &self,
        config: &ConfigNode,
        meta: &ConfigNode,
        args: &MacroArgs,
    ) -> Result<Vec<Report>> {
        let declared: Vec<&str> = self
            .validators
            .iter()
            .flat_map(|v| v.parameters().iter().copied())
            .collect();
        if let Some(arg) = args.find_undeclared(&declared) {
            return Err(MacroError::UnsupportedArgument {
                macro_name: self.validator_names().join(","),
                arg: arg.to_string(),
            });
        }
        let mut reports = Vec::new();
        for validator in &self.validators {
            let selected = args.select(validator.parameters());
            let produced = validator.validate(config, meta, &selected)?;
            debug!(macro_name = validator.name(), reports = produced.len(), "validated");
            reports.extend(tag_origin(produced, validator.name()));
        }
        Ok(reports)
    }

    /// Run the named transformers, in the order given, sequentially over
    /// the same tree.
    ///
    /// Each transformer observes the output of the previous one. Reports
    /// are aggregated across the chain.
    pub fn transform(
        &self,
        names: &[&str],
        config: &mut ConfigNode,
        meta: &ConfigNode,
        args: &MacroArgs,
    ) -> Result<Vec<Report>> {
        let mut chain = Vec::with_capacity(names.len());
        for name in names {
            let transformer = self
                .transformers
                .iter()
                .find(|t| t.name() == *name)
                .ok_or_else(|| MacroError::NotFound {
                    macro_name: (*name).to_string(),
                })?;
            chain.push(transformer);
        }
        let declared: Vec<&str> = chain
            .iter()
            .flat_map(|t| t.parameters().iter().copied())
            .collect();
        if let Some(arg) = args.find_undeclared(&declared) {
            return Err(MacroError::UnsupportedArgument {
                macro_name: names.join(","),
                arg: arg.to_string(),
            });
        }
        let mut reports = Vec::new();
        for transformer in chain {
            let selected = args.select(transformer.parameters());
            let produced = transformer.transform(config, meta, &selected)?;
            debug!(macro_name = transformer.name(), changes = produced.len(), "transformed");
            reports.extend(tag_origin(produced, transformer.name()));
        }
        Ok(reports)
    }
}

pub(crate) fn tag_origin(reports: Vec<Report>, origin: &str) -> Vec<Report> {
    reports
        .into_iter()
        .map(|mut report| {
            if report.origin.is_empty() {
                report.origin = origin.to_string();
            }
            report
        })
        .collect()
}
