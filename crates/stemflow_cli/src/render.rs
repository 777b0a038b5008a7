//! Terminal rendering of the job event stream.

use std::io::{self, Write};

use anyhow::Result;
use stemflow_core::models::JobEvent;

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Log lines and a progress bar on stderr, result on stdout.
    Text,
    /// Only the result.
    Quiet,
    /// One JSON object per event on stdout.
    Json,
}

/// Renders events as they arrive.
pub struct EventRenderer {
    mode: RenderMode,
    /// A progress bar occupies the current stderr line.
    bar_visible: bool,
}

impl EventRenderer {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            bar_visible: false,
        }
    }

    pub fn render(&mut self, event: &JobEvent) -> Result<()> {
        match self.mode {
            RenderMode::Json => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                writeln!(out, "{}", event.to_json()?)?;
                out.flush()?;
            }
            RenderMode::Quiet => {
                if let JobEvent::Terminal { message, .. } = event {
                    println!("{}", message);
                }
            }
            RenderMode::Text => self.render_text(event)?,
        }
        Ok(())
    }

    fn render_text(&mut self, event: &JobEvent) -> Result<()> {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        match event {
            JobEvent::LogLine { text } => {
                self.end_bar(&mut err)?;
                writeln!(err, "{}", text)?;
            }
            JobEvent::Progress { percent } => {
                write!(err, "\r{}", progress_bar(*percent))?;
                err.flush()?;
                self.bar_visible = true;
            }
            JobEvent::Terminal { message, .. } => {
                self.end_bar(&mut err)?;
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn end_bar(&mut self, err: &mut impl Write) -> io::Result<()> {
        if self.bar_visible {
            writeln!(err)?;
            self.bar_visible = false;
        }
        Ok(())
    }
}

/// `[#########.....................]  30%`
fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}
