//! Data models for stemflow.
//!
//! This module contains the core data structures shared by every stage:
//! - Bitrate and separation-model enums
//! - The static model catalog
//! - Job configuration
//! - The job event stream and its observer trait

mod catalog;
mod enums;
mod events;
mod job;

pub use catalog::{find_model, ModelInfo, MODEL_CATALOG};
pub use enums::{Bitrate, SeparationModel};
pub use events::{channel_observer, JobEvent, JobObserver};
pub use job::{is_supported_audio_file, JobConfig, SUPPORTED_AUDIO_EXTENSIONS};
