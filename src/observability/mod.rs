//! Structured logging setup for the command-line interface.

mod tracing_init;

pub use tracing_init::*;
