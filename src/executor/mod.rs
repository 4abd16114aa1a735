//! Test execution engine
//!
//! Enumerates validator test URLs and executes them sequentially.

mod enumerator;
mod runner;

pub use enumerator::Payload;
pub use runner::ValidatorRunner;
