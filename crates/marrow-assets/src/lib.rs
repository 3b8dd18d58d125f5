//! Marrow Assets - skeletal animation assets
//!
//! Reads the binary model files written by the offline converter, validates
//! the bone hierarchy and keyframe tables, and caches the result behind
//! shared, immutable [`AnimationAsset`]s.

mod animation;
mod error;
mod format;
mod handle;
mod server;

pub use animation::{
    Animation, AnimationAsset, AssetParts, Bone, Channel, KeyRange, Keyframe, ModelInfo, Track,
};
pub use error::{AssetError, FormatError, ValidationError};
pub use format::{ModelFlags, MODEL_MAGIC, MODEL_VERSION};
pub use handle::{AssetHandle, AssetId};
pub use server::AssetServer;
