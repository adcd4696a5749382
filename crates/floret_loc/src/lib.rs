//! Location handlers: resolve named locations to local content.
//!
//! A [`Location`] starts as nothing but an identifier
//! (`<scheme>:<name>`, bare paths defaulting to "fs"). A handler's
//! `parse` step fills in the scheme, type and per-path digests; its
//! `pull` step materialises the content and records where it landed.
//! [`fetch`] ties the two together with a digest-based cache check so
//! unchanged locations are never pulled twice.
//!
//! Handlers are scanned in registration order; the first one that
//! claims a location wins.

mod digest;
mod error;
mod fs;
mod git;
mod location;
mod registry;
mod svn;

pub use digest::content_digest;
pub use error::LocError;
pub use fs::FsHandler;
pub use git::GitHandler;
pub use location::{LocType, Location};
pub use registry::{fetch, HandlerRegistry, LocHandler, PullContext};
pub use svn::SvnHandler;

/// Operation result type for the location layer.
pub type Result<T> = std::result::Result<T, LocError>;
