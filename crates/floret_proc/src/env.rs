//! The "env" processor: environment variable exports as values.

use crate::context::ProcessContext;
use crate::dispatch::Processor;
use crate::error::{ProcessorError, ProcessorErrorKind};
use crate::Result;
use floret_config::ConfigNode;
use floret_shell::Event;
use tracing::debug;

/// An environment effect: variable/value pairs sorted by name.
///
/// Processors never mutate the process environment directly; they emit
/// one of these and [`apply_env_export`] is the single boundary that
/// touches `std::env`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvExport {
    vars: Vec<(String, String)>,
}

impl EnvExport {
    pub fn new(mut vars: Vec<(String, String)>) -> Self {
        vars.sort();
        EnvExport { vars }
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Apply an environment effect to the real process environment.
pub fn apply_env_export(export: &EnvExport) {
    for (name, value) in export.vars() {
        debug!(name, value, "export");
        std::env::set_var(name, value);
    }
}

/// Substitute `$NAME` and `${NAME}` references in `value`.
///
/// `$$` escapes a literal dollar. An unresolvable reference is an error
/// naming the variable.
pub fn env_var_substitute(value: &str, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }
        match chars.peek() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
            }
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed || name.is_empty() {
                    return Err(unbound(&name));
                }
                out.push_str(&lookup(&name).ok_or_else(|| unbound(&name))?);
            }
            Some((_, c)) if c.is_ascii_alphabetic() || *c == '_' => {
                let mut name = String::new();
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&lookup(&name).ok_or_else(|| unbound(&name))?);
            }
            _ => out.push('$'),
        }
    }
    Ok(out)
}

fn unbound(name: &str) -> ProcessorError {
    ProcessorError::new(
        "env",
        ProcessorErrorKind::UnboundVariable {
            name: name.to_string(),
        },
    )
}

/// Processor for `[env]` sections: resolves variable references and
/// emits an [`EnvExport`].
#[derive(Debug, Clone, Default)]
pub struct EnvProcessor;

impl EnvProcessor {
    pub fn new() -> Self {
        EnvProcessor
    }
}

impl Processor for EnvProcessor {
    fn scheme(&self) -> &str {
        "env"
    }

    fn process(
        &self,
        config: &ConfigNode,
        section_key: &str,
        ctx: &mut ProcessContext<'_>,
    ) -> Result<()> {
        let Ok(Some(section)) = config.get(&[section_key]) else {
            return Ok(());
        };
        if section.is_ignored() {
            return Ok(());
        }
        let mut vars = Vec::new();
        for (key, node) in section.children() {
            if node.is_ignored() {
                continue;
            }
            let Some(raw) = node.as_scalar() else {
                continue;
            };
            let resolved = env_var_substitute(raw, &|name| {
                ctx.env_var(name)
                    .map(str::to_string)
                    .or_else(|| vars_lookup(&vars, name))
            })
            .map_err(|err| {
                ProcessorError::new(section_key, err.kind).with_setting(key, raw)
            })?;
            let resolved = expand_home(&resolved, ctx);
            vars.push((key.to_string(), resolved));
        }
        let export = EnvExport::new(vars);
        for (name, value) in export.vars() {
            ctx.sink
                .event(Event::info("env-export", format!("export {name}={value}")));
        }
        ctx.push_env_export(export);
        Ok(())
    }
}

fn vars_lookup(vars: &[(String, String)], name: &str) -> Option<String> {
    vars.iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

fn expand_home(value: &str, ctx: &ProcessContext<'_>) -> String {
    if let Some(rest) = value.strip_prefix("~/") {
        if let Some(home) = ctx.env_var("HOME") {
            return format!("{home}/{rest}");
        }
    }
    value.to_string()
}
