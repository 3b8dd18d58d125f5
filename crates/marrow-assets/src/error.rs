use std::path::PathBuf;

use crate::animation::Track;

/// Errors that can occur during asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed model data: {0}")]
    Format(#[from] FormatError),

    #[error("invalid model data: {0}")]
    Invalid(#[from] ValidationError),
}

/// The byte stream does not match the model file layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("bad magic {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported model version {0}")]
    UnsupportedVersion(u32),

    #[error("{section} needs {needed} bytes but only {available} remain")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{0} unexpected bytes after the last table")]
    TrailingBytes(usize),

    #[error("animation tables present but the has-animation flag is clear")]
    MissingAnimationFlag,
}

/// The tables parsed but break an invariant the evaluator depends on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("bone {index} is stored with id {id}")]
    BoneId { index: u32, id: u32 },

    #[error("bone {bone} has parent {parent}, which does not precede it")]
    BoneOrder { bone: u32, parent: u32 },

    #[error("bone {bone} links to {link}, which is not a valid child or sibling")]
    BoneLink { bone: u32, link: u32 },

    #[error("animation {animation} has invalid timing (duration {duration}, {ticks_per_second} ticks/s)")]
    AnimationTiming {
        animation: u32,
        duration: f32,
        ticks_per_second: f32,
    },

    #[error("animation {animation} references channels outside the channel table")]
    ChannelRange { animation: u32 },

    #[error("channel {channel} drives bone {bone}, which does not exist")]
    ChannelBone { channel: u32, bone: u32 },

    #[error("channel {channel} {track} keys lie outside the keyframe table")]
    KeyRange { channel: u32, track: Track },

    #[error("channel {channel} {track} key times are not strictly ascending")]
    KeyOrder { channel: u32, track: Track },
}
