//! Marrow Anim - skeletal animation playback
//!
//! Each animated entity carries an [`AnimationState`] in a component pool.
//! Once per frame the [`AnimationSystem`] advances every state's clocks and
//! resolves its pose into a palette of skinning matrices for the renderer.

mod config;
mod error;
mod pose;
mod sample;
mod state;
mod system;

pub use config::{AnimationConfig, BlendMode};
pub use error::AnimationError;
pub use sample::{sample_channel, sample_track};
pub use state::AnimationState;
pub use system::{AnimationSystem, ResolveStats};
