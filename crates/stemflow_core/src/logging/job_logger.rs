//! Per-job logger and event emitter.
//!
//! Each job gets its own logger that:
//! - Is the only path through which the job's `JobEvent`s reach the observer
//! - Optionally mirrors log lines into a dedicated log file
//! - Keeps progress monotonic and the terminal event unique
//! - Maintains a tail buffer of external tool output for error diagnosis

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogConfig, LogLevel, MessagePrefix};
use crate::acquisition::sanitize_filename;
use crate::models::{JobEvent, JobObserver};

/// Per-job logger with observer + optional file output.
pub struct JobLogger {
    /// Job name for identification.
    job_name: String,
    /// Path to log file, if file output is enabled.
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Mutex<Option<BufWriter<File>>>,
    /// Receiver of the event stream.
    observer: Box<dyn JobObserver>,
    /// Logging configuration.
    config: LogConfig,
    /// Recent external tool output lines.
    tail_buffer: Mutex<VecDeque<String>>,
    /// Last progress value emitted.
    last_progress: Mutex<Option<u8>>,
    /// Set once the terminal event has been emitted.
    finished: AtomicBool,
}

impl JobLogger {
    /// Create a new job logger.
    ///
    /// # Arguments
    /// * `job_name` - Name of the job (used in log filename)
    /// * `log_dir` - Directory for the job log file, `None` disables file output
    /// * `config` - Logging configuration
    /// * `observer` - Receiver of the job's events
    pub fn new(
        job_name: impl Into<String>,
        log_dir: Option<&Path>,
        config: LogConfig,
        observer: Box<dyn JobObserver>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();

        let (log_path, file_writer) = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let stamp = Local::now().format("%Y%m%d-%H%M%S");
                let path = dir.join(format!("{}-{}.log", sanitize_filename(&job_name), stamp));
                let file = File::create(&path)?;
                (Some(path), Some(BufWriter::new(file)))
            }
            None => (None, None),
        };

        Ok(Self {
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            job_name,
            log_path,
            file_writer: Mutex::new(file_writer),
            observer,
            config,
            last_progress: Mutex::new(None),
            finished: AtomicBool::new(false),
        })
    }

    /// Logger without file output.
    pub fn without_file(
        job_name: impl Into<String>,
        config: LogConfig,
        observer: Box<dyn JobObserver>,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            log_path: None,
            file_writer: Mutex::new(None),
            observer,
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            config,
            last_progress: Mutex::new(None),
            finished: AtomicBool::new(false),
        }
    }

    /// Get the job name.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// Get the log file path.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Whether the terminal event has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Last progress value emitted, if any.
    pub fn last_progress(&self) -> Option<u8> {
        *self.last_progress.lock()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Trace => tracing::trace!(job = %self.job_name, "{}", message),
            LogLevel::Debug => tracing::debug!(job = %self.job_name, "{}", message),
            LogLevel::Info => tracing::info!(job = %self.job_name, "{}", message),
            LogLevel::Warn => tracing::warn!(job = %self.job_name, "{}", message),
            LogLevel::Error => tracing::error!(job = %self.job_name, "{}", message),
        }

        if level < self.config.level {
            return;
        }

        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug message.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning message.
    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Debug, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Debug, &msg);
    }

    /// Emit a progress event.
    ///
    /// Values above 100 are clamped. A value not greater than the last
    /// emitted one is dropped so the stream stays monotonic and 100 is
    /// reported once. Returns true if an event was emitted.
    pub fn progress(&self, percent: u32) -> bool {
        let percent = percent.min(100) as u8;
        {
            let mut last = self.last_progress.lock();
            if matches!(*last, Some(prev) if percent <= prev) {
                return false;
            }
            *last = Some(percent);
        }

        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", self.format_message(&format!("Progress: {}%", percent)));
        }
        self.emit(JobEvent::Progress { percent })
    }

    /// Record a diagnostic line from an external tool.
    ///
    /// Always kept in the tail buffer; forwarded to the observer only
    /// outside compact mode.
    pub fn output_line(&self, line: &str) {
        {
            let mut buffer = self.tail_buffer.lock();
            if self.config.error_tail > 0 && buffer.len() >= self.config.error_tail {
                buffer.pop_front();
            }
            if self.config.error_tail > 0 {
                buffer.push_back(line.to_string());
            }
        }

        if self.config.compact {
            if let Some(ref mut writer) = *self.file_writer.lock() {
                let _ = writeln!(writer, "{}", line);
            }
            return;
        }

        self.output(&self.format_message(line));
    }

    /// Replay the tail buffer (typically after a tool failure).
    pub fn show_tail(&self, header: &str) {
        let lines: Vec<String> = self.tail_buffer.lock().iter().cloned().collect();
        if lines.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in lines {
            self.output(&self.format_message(&line));
        }
    }

    /// Get the current tail buffer contents.
    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    /// Emit the terminal event and close the log file.
    ///
    /// Only the first call emits; afterwards the logger is silent.
    /// Returns true if this call emitted the terminal event.
    pub fn finish(&self, success: bool, message: &str) -> bool {
        if self.is_finished() {
            return false;
        }

        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", self.format_message(message));
        }
        let emitted = self.emit(JobEvent::Terminal {
            success,
            message: message.to_string(),
        });
        self.finished.store(true, Ordering::SeqCst);
        self.close();
        emitted
    }

    /// Flush the log file.
    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Close the log file and release it.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    /// Format a message with timestamp (if enabled).
    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            let timestamp = Local::now().format("%H:%M:%S");
            format!("[{}] {}", timestamp, message)
        } else {
            message.to_string()
        }
    }

    /// Output a formatted line to file and observer.
    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        self.emit(JobEvent::LogLine {
            text: formatted.to_string(),
        });
    }

    fn emit(&self, event: JobEvent) -> bool {
        if self.is_finished() {
            return false;
        }
        self.observer.on_event(event);
        true
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}
