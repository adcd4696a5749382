//! Filter-expression compiler.
//!
//! User-supplied filters compile to a WHERE clause with `?`
//! placeholders only; values never appear in the SQL text. Column names
//! are checked against an allow-list before they reach the SQL string,
//! so a filter can only ever touch the columns a DAO exposes.

use crate::error::{DbError, Result};

/// Comparison operator in a filter atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Substring match, compiled to LIKE with wildcards around the value.
    Contains,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Contains => "LIKE",
        }
    }
}

/// A query filter: a comparison, or a boolean combination of filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Atom(String, FilterOp, String),
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    pub fn atom(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        FilterExpr::Atom(column.into(), op, value.into())
    }
}

/// A compiled filter: SQL fragment plus its bind parameters in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<String>,
}

/// Compile a filter against a column allow-list.
///
/// An empty And/Or group compiles to the always-true clause `1`, so a
/// caller with no filter gets an unconditional query rather than a
/// special case.
pub fn compile(expr: &FilterExpr, allowed: &[&str]) -> Result<CompiledFilter> {
    let mut params = Vec::new();
    let sql = compile_expr(expr, allowed, &mut params)?;
    Ok(CompiledFilter { sql, params })
}

fn compile_expr(expr: &FilterExpr, allowed: &[&str], params: &mut Vec<String>) -> Result<String> {
    match expr {
        FilterExpr::Atom(column, op, value) => {
            if !allowed.contains(&column.as_str()) {
                return Err(DbError::InvalidFilterColumn {
                    column: column.clone(),
                });
            }
            params.push(match op {
                FilterOp::Contains => format!("%{value}%"),
                _ => value.clone(),
            });
            Ok(format!("{column} {} ?", op.sql()))
        }
        FilterExpr::And(items) => compile_group(items, " AND ", allowed, params),
        FilterExpr::Or(items) => compile_group(items, " OR ", allowed, params),
    }
}

fn compile_group(
    items: &[FilterExpr],
    joiner: &str,
    allowed: &[&str],
    params: &mut Vec<String>,
) -> Result<String> {
    if items.is_empty() {
        return Ok("1".to_string());
    }
    let parts = items
        .iter()
        .map(|item| compile_expr(item, allowed, params))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(joiner)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLS: &[&str] = &["owner", "project", "title"];

    #[test]
    fn atom_compiles_to_placeholder() {
        let f = compile(&FilterExpr::atom("owner", FilterOp::Eq, "fred"), COLS).unwrap();
        assert_eq!(f.sql, "owner = ?");
        assert_eq!(f.params, vec!["fred"]);
    }

    #[test]
    fn contains_wraps_value_in_wildcards() {
        let f = compile(&FilterExpr::atom("title", FilterOp::Contains, "ocean"), COLS).unwrap();
        assert_eq!(f.sql, "title LIKE ?");
        assert_eq!(f.params, vec!["%ocean%"]);
    }

    #[test]
    fn values_never_reach_the_sql_text() {
        let hostile = "x' OR '1'='1";
        let f = compile(&FilterExpr::atom("owner", FilterOp::Eq, hostile), COLS).unwrap();
        assert!(!f.sql.contains(hostile));
        assert_eq!(f.params, vec![hostile]);
    }

    #[test]
    fn disallowed_column_is_rejected() {
        let err = compile(&FilterExpr::atom("password", FilterOp::Eq, "x"), COLS).unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidFilterColumn { ref column } if column == "password"
        ));
    }

    #[test]
    fn nested_groups_keep_parameter_order() {
        let expr = FilterExpr::And(vec![
            FilterExpr::atom("owner", FilterOp::Eq, "fred"),
            FilterExpr::Or(vec![
                FilterExpr::atom("project", FilterOp::Eq, "ocean"),
                FilterExpr::atom("project", FilterOp::Eq, "ice"),
            ]),
        ]);
        let f = compile(&expr, COLS).unwrap();
        assert_eq!(f.sql, "(owner = ? AND (project = ? OR project = ?))");
        assert_eq!(f.params, vec!["fred", "ocean", "ice"]);
    }

    #[test]
    fn empty_group_is_always_true() {
        let f = compile(&FilterExpr::And(vec![]), COLS).unwrap();
        assert_eq!(f.sql, "1");
        assert!(f.params.is_empty());
        let f = compile(&FilterExpr::Or(vec![]), COLS).unwrap();
        assert_eq!(f.sql, "1");
    }

    #[test]
    fn rejection_happens_inside_nested_groups_too() {
        let expr = FilterExpr::Or(vec![
            FilterExpr::atom("owner", FilterOp::Eq, "fred"),
            FilterExpr::atom("secret", FilterOp::Eq, "x"),
        ]);
        assert!(compile(&expr, COLS).is_err());
    }
}
