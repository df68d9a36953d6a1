//! Filesystem side of a request: resolving paths under the served root and
//! rendering directory listings.

pub mod listing;
pub mod resolver;

pub use listing::render_listing;
pub use resolver::{ResolvedResource, Resolver};
