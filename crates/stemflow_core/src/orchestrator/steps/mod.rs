//! Pipeline step implementations.
//!
//! Each step handles one stage of the acquire/analyze/transcode/separate
//! pipeline.

mod acquire;
mod analyze;
mod separate;
mod transcode;

pub use acquire::AcquireStep;
pub use analyze::AnalyzeStep;
pub use separate::{SeparateStep, SEPARATE_DONE_PROGRESS, SEPARATE_PROGRESS};
pub use transcode::{TranscodeStep, TRANSCODE_DONE_PROGRESS};
