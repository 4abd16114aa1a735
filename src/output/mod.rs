//! Output module
//!
//! Human-readable reporting of validator results.

mod reporter;
mod sink;

pub use reporter::ResultReporter;
pub use sink::{ConsoleSink, OutputSink};

#[cfg(test)]
pub use reporter::{FAILURE_REASON_END, FAILURE_REASON_START};
#[cfg(test)]
pub use sink::BufferSink;
