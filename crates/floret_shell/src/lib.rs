//! Subprocess execution and event reporting.
//!
//! Processors and location handlers shell out to external tools (`svn`,
//! template engines, archive utilities). This crate is the single
//! boundary where that happens: [`CommandRunner`] is the capability the
//! rest of the system is handed, and [`SystemRunner`] is the production
//! implementation. A command that exceeds its deadline is killed and
//! surfaced as an error, never as a silent partial success.
//!
//! [`EventSink`] is the opaque "append event" capability used for
//! progress reporting; the production sink forwards to `tracing`.

mod command;
mod event;
mod logging;

pub use command::{CommandOutput, CommandRunner, CommandSpec, ShellError, SystemRunner};
pub use event::{Event, EventLevel, EventSink, MemorySink, TracingSink};
pub use logging::init_logging;

/// Operation result type for the shell layer.
pub type Result<T> = std::result::Result<T, ShellError>;
