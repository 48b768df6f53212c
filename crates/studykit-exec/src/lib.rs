//! studykit-exec - external process execution
//!
//! Spawns an external command, races it against a deadline and captures its
//! output into a structured [`ExecutionResult`]:
//! - exactly one settlement per call (process exit or deadline, never both)
//! - spawn failures are reported as synthetic non-zero results
//! - probes for tool presence and version (`<tool> --version`, `which`/`where`)

pub mod error;
pub mod executor;
pub mod probe;
pub mod request;

pub use error::{ExecError, Result};
pub use executor::{
    CommandRunner, ExecutionResult, ProcessExecutor, NOT_EXECUTABLE_EXIT_CODE,
    SPAWN_FAILED_EXIT_CODE, TIMEOUT_EXIT_CODE,
};
pub use probe::{
    command_version, is_command_available, locate_command, lookup_program, PROBE_TIMEOUT,
};
pub use request::{ExecutionRequest, DEFAULT_TIMEOUT_MS};
