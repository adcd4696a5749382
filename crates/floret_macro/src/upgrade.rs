//! Version upgrade chains.

use crate::args::MacroArgs;
use crate::engine::tag_origin;
use crate::error::MacroError;
use crate::report::Report;
use crate::Result;
use floret_config::ConfigNode;
use tracing::info;

/// Root-level setting holding the configuration's version tag.
const VERSION_SETTING: &[&str] = &["meta"];

/// A transformer bound to a version interval.
///
/// An upgrader carries a configuration from `before_tag` to `after_tag`.
/// Chains of upgraders with contiguous intervals form an upgrade path.
pub trait Upgrader {
    fn name(&self) -> &str;

    fn parameters(&self) -> &[&str] {
        &[]
    }

    fn before_tag(&self) -> &str;

    fn after_tag(&self) -> &str;

    fn upgrade(
        &self,
        config: &mut ConfigNode,
        meta: &ConfigNode,
        args: &MacroArgs,
    ) -> Result<Vec<Report>>;
}

/// Resolve the ordered upgrader chain from `from_tag` to `to_tag`.
///
/// The chain must be contiguous: each upgrader starts where the previous
/// one ended. A tag claimed by more than one upgrader is ambiguous and
/// resolution refuses to guess. `from_tag == to_tag` yields an empty
/// chain.
pub fn resolve_chain<'a>(
    upgraders: &'a [Box<dyn Upgrader>],
    from_tag: &str,
    to_tag: &str,
) -> Result<Vec<&'a dyn Upgrader>> {
    let mut chain: Vec<&dyn Upgrader> = Vec::new();
    let mut current = from_tag.to_string();
    while current != to_tag {
        let mut claimants = upgraders
            .iter()
            .filter(|u| u.before_tag() == current)
            .map(|u| &**u);
        let next = claimants.next().ok_or_else(|| MacroError::NoUpgradePath {
            from_tag: from_tag.to_string(),
            to_tag: to_tag.to_string(),
        })?;
        if claimants.next().is_some() {
            return Err(MacroError::AmbiguousUpgradePath { tag: current });
        }
        chain.push(next);
        current = next.after_tag().to_string();
        if chain.len() > upgraders.len() {
            // Tag cycle: the walk revisited an interval.
            return Err(MacroError::NoUpgradePath {
                from_tag: from_tag.to_string(),
                to_tag: to_tag.to_string(),
            });
        }
    }
    Ok(chain)
}

/// Applies upgrade chains to configurations.
#[derive(Default)]
pub struct UpgradeRunner {
    upgraders: Vec<Box<dyn Upgrader>>,
}

impl UpgradeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, upgrader: Box<dyn Upgrader>) {
        self.upgraders.push(upgrader);
    }

    /// Version tags reachable from `from_tag`, in chain order.
    pub fn reachable_tags(&self, from_tag: &str) -> Vec<String> {
        let mut tags = Vec::new();
        let mut current = from_tag.to_string();
        loop {
            let mut next = self
                .upgraders
                .iter()
                .filter(|u| u.before_tag() == current)
                .map(|u| u.after_tag().to_string());
            match next.next() {
                Some(tag) if next.next().is_none() && !tags.contains(&tag) => {
                    tags.push(tag.clone());
                    current = tag;
                }
                _ => break,
            }
        }
        tags
    }

    /// Upgrade `config` from `from_tag` to `to_tag`.
    ///
    /// Applies the resolved chain in order over the same tree and returns
    /// the union of the chain's reports, plus a final report for the
    /// version setting rewrite.
    pub fn upgrade(
        &self,
        config: &mut ConfigNode,
        meta: &ConfigNode,
        from_tag: &str,
        to_tag: &str,
        args: &MacroArgs,
    ) -> Result<Vec<Report>> {
        let chain = resolve_chain(&self.upgraders, from_tag, to_tag)?;
        let declared: Vec<&str> = chain
            .iter()
            .flat_map(|u| u.parameters().iter().copied())
            .collect();
        if let Some(arg) = args.find_undeclared(&declared) {
            return Err(MacroError::UnsupportedArgument {
                macro_name: chain
                    .iter()
                    .map(|u| u.name())
                    .collect::<Vec<_>>()
                    .join(","),
                arg: arg.to_string(),
            });
        }
        let mut reports = Vec::new();
        for upgrader in chain {
            let selected = args.select(upgrader.parameters());
            let produced = upgrader.upgrade(config, meta, &selected)?;
            reports.extend(tag_origin(produced, upgrader.name()));
        }
        config.set(VERSION_SETTING, Some(to_tag), None)?;
        info!(from_tag, to_tag, changes = reports.len(), "upgraded");
        reports.push(
            Report::new("meta", None, Some(to_tag))
                .with_info(format!("Upgraded from {from_tag} to {to_tag}")),
        );
        Ok(reports)
    }
}
