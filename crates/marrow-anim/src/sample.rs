//! Keyframe track sampling.

use glam::{Quat, Vec3};
use marrow_assets::{AnimationAsset, Channel, Keyframe};
use marrow_core::{Interpolate, Transform};

/// Sample a track at `ticks`.
///
/// An empty track yields `default`, a single key yields its value. Otherwise
/// the result interpolates between the last key at or before `ticks` and the
/// first key after it; positions outside the keyed range hold the nearest end.
pub fn sample_track<T: Interpolate>(keys: &[Keyframe<T>], ticks: f32, default: T) -> T {
    match keys {
        [] => default,
        [only] => only.value,
        _ => {
            let next = keys.partition_point(|k| k.time <= ticks);
            if next == 0 {
                return keys[0].value;
            }
            let Some(fb) = keys.get(next) else {
                return keys[keys.len() - 1].value;
            };
            let fa = &keys[next - 1];
            let t = ((ticks - fa.time) / (fb.time - fa.time)).clamp(0.0, 1.0);
            T::interpolate(fa.value, fb.value, t)
        }
    }
}

/// Sample all three tracks of a channel into a local transform.
pub fn sample_channel(asset: &AnimationAsset, channel: &Channel, ticks: f32) -> Transform {
    Transform {
        translation: sample_track(asset.translation_keys(channel), ticks, Vec3::ZERO),
        rotation: sample_track(asset.rotation_keys(channel), ticks, Quat::IDENTITY),
        scale: sample_track(asset.scale_keys(channel), ticks, Vec3::ONE),
    }
}
