//! Marrow Core - Core types and utilities for the Marrow engine
//!
//! This crate provides the foundational types used throughout the engine:
//! - Mathematical primitives (re-exported from glam)
//! - TRS transform and interpolation helpers shared by the animation code
//! - Frame time tracking

pub mod math;
pub mod time;
pub mod types;

pub use glam::{Mat4, Quat, Vec3, Vec4};
pub use math::{lerp_mat4, Interpolate};
pub use time::{GameTime, TimeConfig};
pub use types::Transform;
