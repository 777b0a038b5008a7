//! Process runner for external tools.
//!
//! Spawns a tool, streams its diagnostic (stderr) output line by line
//! into the job logger, converts `N%` tokens into overall progress and
//! turns a non-zero exit into a `ProcessError`. One attempt, no retries.

use std::io::{self, Read};
use std::process::{Child, ExitStatus, Stdio};
use std::thread;

use thiserror::Error;

use super::command::ToolCommand;
use super::progress::{extract_percent, for_each_line, scale_progress};
use crate::logging::JobLogger;

/// Failure of an external tool invocation.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The tool could not be started (missing executable, permissions).
    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Reading the tool's output or waiting for it failed.
    #[error("I/O error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The tool exited unsuccessfully.
    #[error("Command failed ({}): {command}", describe_exit(.exit_code))]
    Failed {
        command: String,
        exit_code: Option<i32>,
    },
}

impl ProcessError {
    /// Full command line of the failing invocation.
    pub fn command(&self) -> &str {
        match self {
            ProcessError::Spawn { command, .. }
            | ProcessError::Io { command, .. }
            | ProcessError::Failed { command, .. } => command,
        }
    }

    /// Exit code, if the tool ran and exited with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Runs external tools on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run `command` to completion.
    ///
    /// Each stderr line is recorded with `logger.output_line`. When
    /// `progress_span` is non-zero, the first `N%` on a line is reported
    /// as `progress_offset + N * progress_span / 100`; with a zero span
    /// no progress is emitted at all.
    pub fn run(
        &self,
        command: &ToolCommand,
        progress_offset: u32,
        progress_span: u32,
        logger: &JobLogger,
    ) -> Result<(), ProcessError> {
        let display = command.to_string();
        logger.command(&display);

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: display.clone(),
                source,
            })?;

        let read_result = match child.stderr.take() {
            Some(stderr) => for_each_line(stderr, |line| {
                logger.output_line(line);
                if progress_span == 0 {
                    return;
                }
                if let Some(percent) = extract_percent(line) {
                    logger.progress(scale_progress(progress_offset, progress_span, percent));
                }
            }),
            None => Ok(()),
        };

        if let Err(source) = read_result {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Io {
                command: display,
                source,
            });
        }

        let status = wait(&mut child, &display)?;
        check_status(status, &display, command, logger)
    }

    /// Run `command` and return its standard output.
    ///
    /// Stderr is drained on a helper thread and recorded in the logger's
    /// tail once the tool exits. No progress is reported.
    pub fn capture(&self, command: &ToolCommand, logger: &JobLogger) -> Result<String, ProcessError> {
        let display = command.to_string();
        logger.command(&display);

        let mut child = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: display.clone(),
                source,
            })?;

        let stderr_thread = child.stderr.take().map(|stderr| {
            thread::spawn(move || {
                let mut lines = Vec::new();
                let _ = for_each_line(stderr, |line| lines.push(line.to_string()));
                lines
            })
        });

        let mut stdout = String::new();
        let read_result = match child.stdout.take() {
            Some(mut pipe) => pipe.read_to_string(&mut stdout).map(|_| ()),
            None => Ok(()),
        };

        if let Some(handle) = stderr_thread {
            if let Ok(lines) = handle.join() {
                for line in lines {
                    logger.output_line(&line);
                }
            }
        }

        if let Err(source) = read_result {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProcessError::Io {
                command: display,
                source,
            });
        }

        let status = wait(&mut child, &display)?;
        check_status(status, &display, command, logger)?;
        Ok(stdout)
    }
}

fn wait(child: &mut Child, display: &str) -> Result<ExitStatus, ProcessError> {
    child.wait().map_err(|source| ProcessError::Io {
        command: display.to_string(),
        source,
    })
}

fn check_status(
    status: ExitStatus,
    display: &str,
    command: &ToolCommand,
    logger: &JobLogger,
) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }

    tracing::warn!("{} exited with {:?}", command.program(), status.code());
    logger.show_tail(command.program());
    Err(ProcessError::Failed {
        command: display.to_string(),
        exit_code: status.code(),
    })
}
