//! External process execution with progress capture.

mod command;
mod process;
mod progress;

pub use command::ToolCommand;
pub use process::{ProcessError, ProcessRunner};
pub use progress::{extract_percent, for_each_line, scale_progress, ProgressRange};
