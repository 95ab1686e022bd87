// ABOUTME: Library side of the Latchkey CLI
// ABOUTME: Startup wiring and output rendering shared by the binary and its tests

pub mod bootstrap;
pub mod error;
pub mod output;

pub use error::{CliError, CliResult};
