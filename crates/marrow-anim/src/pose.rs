//! Pose resolution: keyframes to skinning matrices.

use glam::Mat4;
use marrow_assets::{Animation, AnimationAsset};
use marrow_core::{lerp_mat4, Transform};

use crate::config::BlendMode;
use crate::sample::sample_channel;

/// The outgoing animation of a cross-fade.
pub(crate) struct FadeSource<'a> {
    pub animation: &'a Animation,
    pub time: f32,
    pub factor: f32,
}

/// Resolve one frame into `out`, which must hold exactly one matrix per bone.
///
/// Relies on the asset's validated parent-before-child ordering to compose
/// the hierarchy in a single forward pass.
pub(crate) fn resolve(
    asset: &AnimationAsset,
    current: &Animation,
    time: f32,
    fade: Option<FadeSource<'_>>,
    mode: BlendMode,
    out: &mut [Mat4],
) {
    debug_assert_eq!(out.len(), asset.num_bones());
    let bones = asset.bones();

    for (matrix, bone) in out.iter_mut().zip(bones) {
        *matrix = bone.transform;
    }

    let ticks = current.ticks_at(time);
    for channel in asset.channels_of(current) {
        out[channel.bone as usize] = sample_channel(asset, channel, ticks).matrix();
    }

    if let Some(fade) = fade {
        let ticks = fade.animation.ticks_at(fade.time);
        for channel in asset.channels_of(fade.animation) {
            let old = sample_channel(asset, channel, ticks);
            let matrix = &mut out[channel.bone as usize];
            *matrix = match mode {
                BlendMode::Matrix => lerp_mat4(matrix, &old.matrix(), fade.factor),
                BlendMode::Decomposed => {
                    Transform::lerp(&Transform::from_matrix(matrix), &old, fade.factor).matrix()
                }
            };
        }
    }

    for (index, bone) in bones.iter().enumerate() {
        if let Some(parent) = bone.parent {
            out[index] = out[parent as usize] * out[index];
        }
    }

    for (matrix, bone) in out.iter_mut().zip(bones) {
        *matrix *= bone.offset;
    }
}
