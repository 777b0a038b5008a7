//! Core enums used throughout the pipeline.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::catalog::{ModelInfo, MODEL_CATALOG};

/// Output bitrate of the transcoded MP3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitrate {
    Kbps96,
    Kbps128,
    Kbps192,
    #[default]
    Kbps320,
}

impl Bitrate {
    /// All selectable bitrates, lowest first.
    pub const ALL: [Bitrate; 4] = [
        Bitrate::Kbps96,
        Bitrate::Kbps128,
        Bitrate::Kbps192,
        Bitrate::Kbps320,
    ];

    /// Bitrate in kilobits per second.
    pub fn kbps(&self) -> u32 {
        match self {
            Bitrate::Kbps96 => 96,
            Bitrate::Kbps128 => 128,
            Bitrate::Kbps192 => 192,
            Bitrate::Kbps320 => 320,
        }
    }

    /// Value passed to the encoder's `-b:a` flag (e.g. `320k`).
    pub fn encoder_arg(&self) -> String {
        format!("{}k", self.kbps())
    }
}

impl std::fmt::Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} kbps", self.kbps())
    }
}

impl TryFrom<u32> for Bitrate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Bitrate::ALL
            .into_iter()
            .find(|b| b.kbps() == value)
            .ok_or_else(|| format!("unsupported bitrate {value} kbps (expected 96, 128, 192 or 320)"))
    }
}

impl From<Bitrate> for u32 {
    fn from(bitrate: Bitrate) -> Self {
        bitrate.kbps()
    }
}

impl FromStr for Bitrate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches("kbps").trim_end_matches('k').trim();
        let value: u32 = trimmed
            .parse()
            .map_err(|_| format!("invalid bitrate '{s}'"))?;
        Bitrate::try_from(value)
    }
}

/// Source-separation model, one variant per catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeparationModel {
    #[default]
    #[serde(rename = "htdemucs")]
    Htdemucs,
    #[serde(rename = "htdemucs_ft")]
    HtdemucsFt,
    #[serde(rename = "mdx")]
    Mdx,
    #[serde(rename = "mdx_extra_q")]
    MdxExtraQ,
    #[serde(rename = "hdemucs_mmi")]
    HdemucsMmi,
}

impl SeparationModel {
    /// Identifier understood by the separator (`-n <id>`).
    pub fn id(&self) -> &'static str {
        self.info().id
    }

    /// Catalog entry for this model.
    pub fn info(&self) -> &'static ModelInfo {
        let index = match self {
            SeparationModel::Htdemucs => 0,
            SeparationModel::HtdemucsFt => 1,
            SeparationModel::Mdx => 2,
            SeparationModel::MdxExtraQ => 3,
            SeparationModel::HdemucsMmi => 4,
        };
        &MODEL_CATALOG[index]
    }

    /// Number of stem files produced for the given mode.
    pub fn stem_count(&self, two_stems: bool) -> usize {
        if two_stems {
            2
        } else {
            self.info().stem_count
        }
    }
}

impl std::fmt::Display for SeparationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for SeparationModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MODEL_CATALOG
            .iter()
            .find(|info| info.id == s.trim())
            .map(|info| info.model)
            .ok_or_else(|| {
                let known: Vec<&str> = MODEL_CATALOG.iter().map(|m| m.id).collect();
                format!("unknown model '{}' (known: {})", s, known.join(", "))
            })
    }
}
