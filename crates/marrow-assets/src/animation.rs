//! In-memory skeletal animation data.

use std::fmt;
use std::ops::Range;

use glam::{Mat4, Quat, Vec3};

use crate::error::ValidationError;
use crate::format::ModelFlags;

/// A node of the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub id: u32,
    /// `None` for roots. Always smaller than the bone's own index.
    pub parent: Option<u32>,
    pub first_child: Option<u32>,
    pub next_sibling: Option<u32>,
    /// Bind-pose transform relative to the parent.
    pub transform: Mat4,
    /// Inverse bind matrix: model space to bind-pose bone space.
    pub offset: Mat4,
}

impl Bone {
    /// A root bone at the given index with identity transforms.
    pub fn root(id: u32) -> Self {
        Self {
            id,
            parent: None,
            first_child: None,
            next_sibling: None,
            transform: Mat4::IDENTITY,
            offset: Mat4::IDENTITY,
        }
    }

    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_offset(mut self, offset: Mat4) -> Self {
        self.offset = offset;
        self
    }
}

/// One clip: its length and the channels that drive it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    pub duration_ticks: f32,
    pub ticks_per_second: f32,
    pub start_channel: u32,
    pub num_channels: u32,
}

impl Animation {
    pub fn channel_range(&self) -> Range<usize> {
        let start = self.start_channel as usize;
        start..start + self.num_channels as usize
    }

    /// Convert elapsed seconds into a looping tick position.
    pub fn ticks_at(&self, seconds: f32) -> f32 {
        (seconds * self.ticks_per_second) % self.duration_ticks
    }
}

/// A `(start, count)` window into one of the global keyframe tables.
/// The start of an empty range is meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyRange {
    pub start: u32,
    pub count: u32,
}

impl KeyRange {
    pub const EMPTY: KeyRange = KeyRange {
        start: u32::MAX,
        count: 0,
    };

    pub fn new(start: u32, count: u32) -> Self {
        if count == 0 {
            Self::EMPTY
        } else {
            Self { start, count }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn range(&self) -> Range<usize> {
        if self.is_empty() {
            return 0..0;
        }
        let start = self.start as usize;
        start..start + self.count as usize
    }
}

/// Keyframes driving one bone within one animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub bone: u32,
    pub translation: KeyRange,
    pub rotation: KeyRange,
    pub scale: KeyRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    /// Position in ticks.
    pub time: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub fn new(time: f32, value: T) -> Self {
        Self { time, value }
    }
}

/// The three keyframe tracks of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Translation,
    Rotation,
    Scale,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Track::Translation => "translation",
            Track::Rotation => "rotation",
            Track::Scale => "scale",
        })
    }
}

/// Mesh-facing header fields carried through for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelInfo {
    pub flags: ModelFlags,
    pub num_texcoord_channels: u32,
    pub num_meshes: u32,
}

/// Unvalidated tables, the input to [`AnimationAsset::from_parts`].
#[derive(Debug, Clone, Default)]
pub struct AssetParts {
    pub info: ModelInfo,
    pub bones: Vec<Bone>,
    pub animations: Vec<Animation>,
    pub channels: Vec<Channel>,
    pub translation_keys: Vec<Keyframe<Vec3>>,
    pub rotation_keys: Vec<Keyframe<Quat>>,
    pub scale_keys: Vec<Keyframe<Vec3>>,
}

/// A validated skeleton with its animation clips.
///
/// Construction checks every index and range, so the accessors below slice
/// without bounds failures and bones can be composed in one forward pass.
#[derive(Debug, Clone)]
pub struct AnimationAsset {
    parts: AssetParts,
}

impl AnimationAsset {
    pub fn from_parts(parts: AssetParts) -> Result<Self, ValidationError> {
        validate_bones(&parts.bones)?;
        validate_animations(&parts.animations, parts.channels.len())?;
        for (index, channel) in parts.channels.iter().enumerate() {
            let index = index as u32;
            if channel.bone as usize >= parts.bones.len() {
                return Err(ValidationError::ChannelBone {
                    channel: index,
                    bone: channel.bone,
                });
            }
            validate_keys(index, Track::Translation, channel.translation, &parts.translation_keys)?;
            validate_keys(index, Track::Rotation, channel.rotation, &parts.rotation_keys)?;
            validate_keys(index, Track::Scale, channel.scale, &parts.scale_keys)?;
        }
        Ok(Self { parts })
    }

    pub fn info(&self) -> &ModelInfo {
        &self.parts.info
    }

    pub fn bones(&self) -> &[Bone] {
        &self.parts.bones
    }

    pub fn num_bones(&self) -> usize {
        self.parts.bones.len()
    }

    pub fn animations(&self) -> &[Animation] {
        &self.parts.animations
    }

    pub fn animation(&self, index: u32) -> Option<&Animation> {
        self.parts.animations.get(index as usize)
    }

    pub fn channels(&self) -> &[Channel] {
        &self.parts.channels
    }

    /// The channels belonging to one animation.
    pub fn channels_of(&self, animation: &Animation) -> &[Channel] {
        &self.parts.channels[animation.channel_range()]
    }

    pub fn translation_keys(&self, channel: &Channel) -> &[Keyframe<Vec3>] {
        &self.parts.translation_keys[channel.translation.range()]
    }

    pub fn rotation_keys(&self, channel: &Channel) -> &[Keyframe<Quat>] {
        &self.parts.rotation_keys[channel.rotation.range()]
    }

    pub fn scale_keys(&self, channel: &Channel) -> &[Keyframe<Vec3>] {
        &self.parts.scale_keys[channel.scale.range()]
    }

    /// Direct children of a bone, in storage order.
    pub fn children(&self, bone: u32) -> impl Iterator<Item = u32> + '_ {
        let first = self
            .parts
            .bones
            .get(bone as usize)
            .and_then(|b| b.first_child);
        std::iter::successors(first, move |&child| self.parts.bones[child as usize].next_sibling)
    }

    pub(crate) fn parts(&self) -> &AssetParts {
        &self.parts
    }
}

fn validate_bones(bones: &[Bone]) -> Result<(), ValidationError> {
    let count = bones.len() as u32;
    for (index, bone) in bones.iter().enumerate() {
        let index = index as u32;
        if bone.id != index {
            return Err(ValidationError::BoneId { index, id: bone.id });
        }
        if let Some(parent) = bone.parent {
            if parent >= index {
                return Err(ValidationError::BoneOrder { bone: index, parent });
            }
        }
        // Children and siblings are written after the bone, which also keeps
        // `children` from looping.
        if let Some(child) = bone.first_child {
            if child <= index || child >= count || bones[child as usize].parent != Some(index) {
                return Err(ValidationError::BoneLink { bone: index, link: child });
            }
        }
        if let Some(sibling) = bone.next_sibling {
            if sibling <= index || sibling >= count || bones[sibling as usize].parent != bone.parent {
                return Err(ValidationError::BoneLink { bone: index, link: sibling });
            }
        }
    }
    Ok(())
}

fn validate_animations(animations: &[Animation], num_channels: usize) -> Result<(), ValidationError> {
    for (index, animation) in animations.iter().enumerate() {
        let index = index as u32;
        let timing_ok = animation.duration_ticks.is_finite()
            && animation.duration_ticks > 0.0
            && animation.ticks_per_second.is_finite()
            && animation.ticks_per_second > 0.0;
        if !timing_ok {
            return Err(ValidationError::AnimationTiming {
                animation: index,
                duration: animation.duration_ticks,
                ticks_per_second: animation.ticks_per_second,
            });
        }
        let end = animation.start_channel.checked_add(animation.num_channels);
        if end.map_or(true, |end| end as usize > num_channels) {
            return Err(ValidationError::ChannelRange { animation: index });
        }
    }
    Ok(())
}

fn validate_keys<T>(
    channel: u32,
    track: Track,
    keys: KeyRange,
    table: &[Keyframe<T>],
) -> Result<(), ValidationError> {
    if keys.is_empty() {
        return Ok(());
    }
    let end = keys.start.checked_add(keys.count);
    if end.map_or(true, |end| end as usize > table.len()) {
        return Err(ValidationError::KeyRange { channel, track });
    }
    let frames = &table[keys.range()];
    let finite = frames.iter().all(|k| k.time.is_finite());
    let ascending = frames.windows(2).all(|w| w[0].time < w[1].time);
    if !finite || !ascending {
        return Err(ValidationError::KeyOrder { channel, track });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bone_parts() -> AssetParts {
        let mut root = Bone::root(0);
        root.first_child = Some(1);
        AssetParts {
            bones: vec![root, Bone::root(1).with_parent(0)],
            animations: vec![Animation {
                duration_ticks: 1.0,
                ticks_per_second: 1.0,
                start_channel: 0,
                num_channels: 1,
            }],
            channels: vec![Channel {
                bone: 0,
                translation: KeyRange::new(0, 2),
                rotation: KeyRange::EMPTY,
                scale: KeyRange::EMPTY,
            }],
            translation_keys: vec![
                Keyframe::new(0.0, Vec3::ZERO),
                Keyframe::new(1.0, Vec3::Y),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn accepts_valid_asset() {
        let asset = AnimationAsset::from_parts(two_bone_parts()).unwrap();
        assert_eq!(asset.num_bones(), 2);
        let anim = asset.animation(0).unwrap();
        let channels = asset.channels_of(anim);
        assert_eq!(channels.len(), 1);
        assert_eq!(asset.translation_keys(&channels[0]).len(), 2);
        assert!(asset.rotation_keys(&channels[0]).is_empty());
        assert!(asset.animation(1).is_none());
    }

    #[test]
    fn children_follow_sibling_links() {
        let mut parts = two_bone_parts();
        parts.bones[1].next_sibling = Some(2);
        parts.bones.push(Bone::root(2).with_parent(0));
        let asset = AnimationAsset::from_parts(parts).unwrap();
        assert_eq!(asset.children(0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(asset.children(1).count(), 0);
        assert_eq!(asset.children(9).count(), 0);
    }

    #[test]
    fn rejects_child_before_parent() {
        let mut parts = two_bone_parts();
        parts.bones[0].first_child = None;
        parts.bones[0].parent = Some(1);
        parts.bones[1].parent = None;
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::BoneOrder { bone: 0, parent: 1 }
        );
    }

    #[test]
    fn rejects_self_parent() {
        let mut parts = two_bone_parts();
        parts.bones[0].first_child = None;
        parts.bones[1].parent = Some(1);
        assert!(matches!(
            AnimationAsset::from_parts(parts),
            Err(ValidationError::BoneOrder { bone: 1, parent: 1 })
        ));
    }

    #[test]
    fn rejects_mismatched_bone_id() {
        let mut parts = two_bone_parts();
        parts.bones[1].id = 4;
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::BoneId { index: 1, id: 4 }
        );
    }

    #[test]
    fn rejects_zero_duration() {
        let mut parts = two_bone_parts();
        parts.animations[0].duration_ticks = 0.0;
        assert!(matches!(
            AnimationAsset::from_parts(parts),
            Err(ValidationError::AnimationTiming { animation: 0, .. })
        ));
    }

    #[test]
    fn rejects_channel_overflow() {
        let mut parts = two_bone_parts();
        parts.animations[0].num_channels = 2;
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::ChannelRange { animation: 0 }
        );
    }

    #[test]
    fn rejects_unknown_channel_bone() {
        let mut parts = two_bone_parts();
        parts.channels[0].bone = 2;
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::ChannelBone { channel: 0, bone: 2 }
        );
    }

    #[test]
    fn rejects_key_range_overflow() {
        let mut parts = two_bone_parts();
        parts.channels[0].scale = KeyRange::new(0, 1);
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::KeyRange {
                channel: 0,
                track: Track::Scale
            }
        );
    }

    #[test]
    fn rejects_unordered_keys() {
        let mut parts = two_bone_parts();
        parts.translation_keys[1].time = 0.0;
        assert_eq!(
            AnimationAsset::from_parts(parts).unwrap_err(),
            ValidationError::KeyOrder {
                channel: 0,
                track: Track::Translation
            }
        );
    }

    #[test]
    fn ticks_wrap_around_duration() {
        let anim = Animation {
            duration_ticks: 10.0,
            ticks_per_second: 4.0,
            start_channel: 0,
            num_channels: 0,
        };
        assert_eq!(anim.ticks_at(1.0), 4.0);
        assert_eq!(anim.ticks_at(3.0), 2.0);
    }
}
