//! URL handling module
//!
//! Resolution of raw anchor/image references into absolute crawlable URLs,
//! and derivation of each host's robots.txt location.

mod domain;
mod resolve;

pub use domain::{extract_domain, robots_url};
pub use resolve::{parse_absolute, resolve_reference};
