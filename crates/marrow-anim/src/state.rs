use std::sync::Arc;

use glam::Mat4;
use marrow_assets::{Animation, AnimationAsset};
use marrow_ecs::{Component, Entity};

use crate::config::BlendMode;
use crate::error::AnimationError;
use crate::pose::{self, FadeSource};

const MATRIX_SIZE: usize = std::mem::size_of::<Mat4>();

/// Per-entity playback state: which clips are playing, their clocks, and the
/// progress of any cross-fade.
///
/// The state is Idle while `cross_fade_factor` is zero and Blending while it
/// is positive. A blend decays to zero over its duration and never below.
#[derive(Debug, Clone)]
pub struct AnimationState {
    model: Option<Arc<AnimationAsset>>,
    current_animation: u32,
    last_animation: u32,
    current_time: f32,
    last_animation_time: f32,
    playback_speed: f32,
    cross_fade_factor: f32,
    cross_fade_speed: f32,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            model: None,
            current_animation: 0,
            last_animation: 0,
            current_time: 0.0,
            last_animation_time: 0.0,
            playback_speed: 1.0,
            cross_fade_factor: 0.0,
            cross_fade_speed: 0.0,
        }
    }
}

impl Component for AnimationState {
    fn for_entity(_: Entity) -> Self {
        Self::default()
    }
}

impl AnimationState {
    pub fn with_model(model: Arc<AnimationAsset>) -> Self {
        Self {
            model: Some(model),
            ..Self::default()
        }
    }

    pub fn model(&self) -> Option<&Arc<AnimationAsset>> {
        self.model.as_ref()
    }

    /// Bind (or unbind) the skeleton this state animates.
    pub fn set_model(&mut self, model: Option<Arc<AnimationAsset>>) {
        self.model = model;
    }

    pub fn current_animation(&self) -> u32 {
        self.current_animation
    }

    pub fn last_animation(&self) -> u32 {
        self.last_animation
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn last_animation_time(&self) -> f32 {
        self.last_animation_time
    }

    pub fn playback_speed(&self) -> f32 {
        self.playback_speed
    }

    pub fn set_playback_speed(&mut self, speed: f32) {
        self.playback_speed = speed;
    }

    pub fn cross_fade_factor(&self) -> f32 {
        self.cross_fade_factor
    }

    pub fn is_blending(&self) -> bool {
        self.cross_fade_factor > 0.0
    }

    /// Switch to `animation` immediately, cancelling any cross-fade.
    /// Playing the current animation again changes nothing.
    pub fn play(&mut self, animation: u32) {
        if animation == self.current_animation {
            return;
        }
        self.cross_fade_factor = 0.0;
        self.current_animation = animation;
        self.current_time = 0.0;
    }

    /// Start `animation` from zero while the current one fades out over
    /// `duration` seconds.
    ///
    /// Ignored while a fade is already running or when `animation` is already
    /// current. A non-positive duration switches immediately.
    pub fn cross_fade(&mut self, animation: u32, duration: f32) {
        if self.is_blending() || animation == self.current_animation {
            return;
        }
        if duration <= 0.0 {
            self.play(animation);
            return;
        }

        self.last_animation = self.current_animation;
        self.last_animation_time = self.current_time;
        self.current_animation = animation;
        self.current_time = 0.0;

        self.cross_fade_factor = 1.0;
        self.cross_fade_speed = 1.0 / duration;
    }

    /// Advance both clocks by `dt` seconds.
    pub fn update_timing(&mut self, dt: f32) {
        if self.is_blending() {
            self.cross_fade_factor =
                (self.cross_fade_factor - self.cross_fade_speed * dt).clamp(0.0, 1.0);
            self.last_animation_time += dt * self.playback_speed;
        }
        self.current_time += dt * self.playback_speed;
    }

    fn current_clip(&self) -> Result<(&AnimationAsset, &Animation), AnimationError> {
        let asset = self.model.as_deref().ok_or(AnimationError::NoModel)?;
        let animation =
            asset
                .animation(self.current_animation)
                .ok_or(AnimationError::AnimationOutOfRange {
                    animation: self.current_animation,
                    count: asset.animations().len(),
                })?;
        Ok((asset, animation))
    }

    fn fade_source<'a>(&self, asset: &'a AnimationAsset) -> Option<FadeSource<'a>> {
        if !self.is_blending() {
            return None;
        }
        asset.animation(self.last_animation).map(|animation| FadeSource {
            animation,
            time: self.last_animation_time,
            factor: self.cross_fade_factor,
        })
    }

    /// Resolve the current pose into `out`, one skinning matrix per bone in
    /// bone-table order. Returns the number of matrices written.
    ///
    /// Nothing is written on error.
    pub fn fill_bone_matrices(&self, out: &mut [Mat4]) -> Result<usize, AnimationError> {
        self.fill_bone_matrices_with(out, BlendMode::Matrix)
    }

    pub fn fill_bone_matrices_with(
        &self,
        out: &mut [Mat4],
        mode: BlendMode,
    ) -> Result<usize, AnimationError> {
        let (asset, animation) = self.current_clip()?;
        let bones = asset.num_bones();
        if out.len() < bones {
            return Err(AnimationError::BufferTooSmall {
                needed: bones * MATRIX_SIZE,
                provided: out.len() * MATRIX_SIZE,
            });
        }

        let fade = self.fade_source(asset);
        pose::resolve(asset, animation, self.current_time, fade, mode, &mut out[..bones]);
        Ok(bones)
    }

    /// Like [`Self::fill_bone_matrices`], but into a raw upload buffer of
    /// column-major `f32` matrices. Returns the number of bytes written.
    pub fn fill_bone_matrices_bytes(&self, out: &mut [u8]) -> Result<usize, AnimationError> {
        self.fill_bone_matrices_bytes_with(out, BlendMode::Matrix)
    }

    pub fn fill_bone_matrices_bytes_with(
        &self,
        out: &mut [u8],
        mode: BlendMode,
    ) -> Result<usize, AnimationError> {
        let (asset, animation) = self.current_clip()?;
        let needed = asset.num_bones() * MATRIX_SIZE;
        if out.len() < needed {
            return Err(AnimationError::BufferTooSmall {
                needed,
                provided: out.len(),
            });
        }

        let mut palette = vec![Mat4::IDENTITY; asset.num_bones()];
        let fade = self.fade_source(asset);
        pose::resolve(asset, animation, self.current_time, fade, mode, &mut palette);
        out[..needed].copy_from_slice(bytemuck::cast_slice(&palette));
        Ok(needed)
    }
}
