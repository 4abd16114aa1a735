//! HTTP client module
//!
//! Provides the HTTP transport shared by discovery, enumeration and test execution.

mod client;

pub use client::{HttpClient, HttpError};

#[cfg(test)]
pub(crate) mod stub;
