//! WOPI discovery
//!
//! Resolves the WOPI Validator test endpoint from a discovery document.

mod resolver;

pub use resolver::{DiscoveryResolver, TestEndpoint};
