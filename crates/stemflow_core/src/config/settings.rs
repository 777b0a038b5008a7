//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::models::{Bitrate, SeparationModel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Job defaults used when a front end does not override them.
    #[serde(default)]
    pub defaults: JobDefaults,
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for MP3s and stems.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for downloads. Empty means the system temp directory.
    #[serde(default)]
    pub temp_root: String,

    /// Folder for per-job log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    ".".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: String::new(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    /// Directory downloads go to.
    pub fn temp_dir(&self) -> PathBuf {
        if self.temp_root.trim().is_empty() {
            std::env::temp_dir()
        } else {
            PathBuf::from(&self.temp_root)
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Keep external tool output out of the event stream (tail buffer only).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines to show after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with a timestamp.
    #[serde(default)]
    pub show_timestamps: bool,

    /// Write a log file per job under the logs folder.
    #[serde(default = "default_true")]
    pub write_job_log: bool,

    /// Minimum level forwarded to the observer.
    #[serde(default)]
    pub level: LogLevel,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: false,
            write_job_log: true,
            level: LogLevel::Info,
        }
    }
}

impl LoggingSettings {
    /// Per-job logger configuration.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}

/// External tool commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable (decode and transcode).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// yt-dlp executable (URL fetch).
    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: String,

    /// Separator program and leading arguments.
    #[serde(default = "default_separator")]
    pub separator: Vec<String>,

    /// MP3 encoder passed to ffmpeg.
    #[serde(default = "default_mp3_codec")]
    pub mp3_codec: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_yt_dlp() -> String {
    "yt-dlp".to_string()
}

fn default_separator() -> Vec<String> {
    vec!["demucs".to_string()]
}

fn default_mp3_codec() -> String {
    "libmp3lame".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            yt_dlp: default_yt_dlp(),
            separator: default_separator(),
            mp3_codec: default_mp3_codec(),
        }
    }
}

/// Default job options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDefaults {
    #[serde(default)]
    pub bitrate: Bitrate,

    #[serde(default)]
    pub model: SeparationModel,

    #[serde(default)]
    pub two_stems: bool,
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Tools,
    Defaults,
}

impl ConfigSection {
    /// All sections, in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Tools,
        ConfigSection::Defaults,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Tools => "tools",
            ConfigSection::Defaults => "defaults",
        }
    }

    /// Comment written above the section.
    pub fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Output and working directories",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Tools => "External tools",
            ConfigSection::Defaults => "Job defaults",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains("[tools]"));
        assert!(toml.contains("[defaults]"));
        assert!(toml.contains("bitrate = 320"));
        assert!(toml.contains("model = \"htdemucs\""));
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.defaults.model = SeparationModel::HdemucsMmi;
        settings.tools.separator = vec!["python3".into(), "-m".into(), "demucs".into()];

        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.defaults.model, SeparationModel::HdemucsMmi);
        assert_eq!(parsed.tools.separator, settings.tools.separator);
        assert_eq!(parsed.logging.compact, settings.logging.compact);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[paths]\noutput_folder = \"stems\"\n[defaults]\nbitrate = 128";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom value preserved
        assert_eq!(parsed.paths.output_folder, "stems");
        assert_eq!(parsed.defaults.bitrate, Bitrate::Kbps128);
        // Defaults applied for missing
        assert!(parsed.logging.compact);
        assert_eq!(parsed.tools.ffmpeg, "ffmpeg");
        assert_eq!(parsed.defaults.model, SeparationModel::Htdemucs);
    }

    #[test]
    fn invalid_bitrate_is_rejected() {
        assert!(toml::from_str::<Settings>("[defaults]\nbitrate = 100").is_err());
    }

    #[test]
    fn empty_temp_root_means_system_temp() {
        let paths = PathSettings::default();
        assert_eq!(paths.temp_dir(), std::env::temp_dir());

        let custom = PathSettings {
            temp_root: "/scratch".into(),
            ..PathSettings::default()
        };
        assert_eq!(custom.temp_dir(), PathBuf::from("/scratch"));
    }

    #[test]
    fn logging_settings_convert() {
        let logging = LoggingSettings {
            compact: false,
            error_tail: 5,
            level: LogLevel::Debug,
            ..LoggingSettings::default()
        };
        let config = logging.to_log_config();
        assert!(!config.compact);
        assert_eq!(config.error_tail, 5);
        assert_eq!(config.level, LogLevel::Debug);
    }
}
