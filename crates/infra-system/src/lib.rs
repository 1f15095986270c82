// Fencecheck Infrastructure - System Adapters
// Implements: ProcessRunner

pub mod command_line;
pub mod subprocess_runner;

pub use command_line::CommandLine;
pub use subprocess_runner::SubprocessRunner;
