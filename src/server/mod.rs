//! Server process lifecycle control.
//!
//! [`ServerProcess`] owns at most one child process at a time and drives it
//! through `Idle -> Starting -> Running -> Stopping -> Idle`. Console output
//! is streamed line-by-line to a caller-supplied [`LogSink`]; commands go in
//! through the child's stdin. Stopping escalates from a polite console
//! `stop` through signals to a process-tree kill, so a stop call always
//! terminates within a bounded time.

mod command;
mod process;
pub(crate) mod sweep;

pub use command::{recommend_ram_mb, LaunchSpec};
pub use process::{LogSink, ServerProcess, ServerStatus, StoppedCallback};
pub use sweep::sweep_leftovers;
