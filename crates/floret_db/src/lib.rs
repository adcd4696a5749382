//! Suite catalogue queries.
//!
//! User-facing filters are a small expression tree ([`FilterExpr`])
//! compiled to parameterised SQL against a column allow-list, then run
//! by [`SuiteDao`] over sqlite.

mod dao;
mod error;
mod filter;

pub use dao::{SuiteDao, SuiteEntry, QUERYABLE_COLUMNS};
pub use error::{DbError, Result};
pub use filter::{compile, CompiledFilter, FilterExpr, FilterOp};
