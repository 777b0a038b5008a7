//! Percentage extraction from tool diagnostic output.

use std::io::{self, Read};

use once_cell::sync::Lazy;
use regex::Regex;

/// One to three digits immediately followed by `%`.
static PERCENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})%").expect("percent pattern is a valid regex"));

/// Extract the first completion percentage from a diagnostic line.
///
/// Values above 100 are not percentages of completion and are skipped
/// in favour of a later match on the same line.
pub fn extract_percent(line: &str) -> Option<u32> {
    PERCENT_PATTERN
        .captures_iter(line)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .find(|&value| value <= 100)
}

/// Map a tool's own percentage into `[offset, offset + span]` of the
/// overall scale, truncating.
pub fn scale_progress(offset: u32, span: u32, percent: u32) -> u32 {
    offset + percent * span / 100
}

/// Sub-range of the overall progress scale handed to one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressRange {
    pub offset: u32,
    pub span: u32,
}

impl ProgressRange {
    /// No sub-progress: tool percentages are ignored.
    pub const NONE: ProgressRange = ProgressRange { offset: 0, span: 0 };

    pub const fn new(offset: u32, span: u32) -> Self {
        Self { offset, span }
    }

    pub fn is_empty(&self) -> bool {
        self.span == 0
    }
}

/// Feed every line of `reader` to `on_line` as it arrives.
///
/// Both `\n` and `\r` end a line, so carriage-return progress bars are
/// seen one update at a time. Empty lines are skipped and invalid UTF-8
/// is replaced.
pub fn for_each_line<R, F>(mut reader: R, mut on_line: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(&str),
{
    let mut chunk = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &byte in &chunk[..n] {
            if byte == b'\n' || byte == b'\r' {
                if !pending.is_empty() {
                    on_line(&String::from_utf8_lossy(&pending));
                    pending.clear();
                }
            } else {
                pending.push(byte);
            }
        }
    }

    if !pending.is_empty() {
        on_line(&String::from_utf8_lossy(&pending));
    }
    Ok(())
}
