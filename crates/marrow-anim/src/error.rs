/// Data errors from pose resolution. The state and the output buffer are
/// left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("no animation asset bound")]
    NoModel,

    #[error("animation {animation} out of range (asset has {count})")]
    AnimationOutOfRange { animation: u32, count: usize },

    #[error("bone buffer holds {provided} bytes, pose needs {needed}")]
    BufferTooSmall { needed: usize, provided: usize },

    #[error("skeleton has {bones} bones, limit is {max}")]
    TooManyBones { bones: usize, max: usize },
}
