//! Static model catalog.
//!
//! The catalog is a fixed, ordered table. Front ends list it in this
//! order and the first entry is the default model.

use serde::Serialize;

use super::enums::SeparationModel;

/// One separation model offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Typed handle for this entry.
    #[serde(skip)]
    pub model: SeparationModel,
    /// Identifier passed to the separator.
    pub id: &'static str,
    /// Human-readable description for pickers.
    pub description: &'static str,
    /// Stems produced in full (non two-stem) mode.
    pub stem_count: usize,
}

/// All models known to the pipeline, in display order.
pub static MODEL_CATALOG: [ModelInfo; 5] = [
    ModelInfo {
        model: SeparationModel::Htdemucs,
        id: "htdemucs",
        description: "htdemucs (4 stems, fast)",
        stem_count: 4,
    },
    ModelInfo {
        model: SeparationModel::HtdemucsFt,
        id: "htdemucs_ft",
        description: "htdemucs_ft (4 stems, fine-tuned)",
        stem_count: 4,
    },
    ModelInfo {
        model: SeparationModel::Mdx,
        id: "mdx",
        description: "mdx (4 stems, fastest)",
        stem_count: 4,
    },
    ModelInfo {
        model: SeparationModel::MdxExtraQ,
        id: "mdx_extra_q",
        description: "mdx_extra_q (4 stems, highest quality)",
        stem_count: 4,
    },
    ModelInfo {
        model: SeparationModel::HdemucsMmi,
        id: "hdemucs_mmi",
        description: "hdemucs_mmi (6 stems, adds guitar & piano)",
        stem_count: 6,
    },
];

/// Look up a catalog entry by model id.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODEL_CATALOG.iter().find(|info| info.id == id)
}
