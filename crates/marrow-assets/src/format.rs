//! Binary model file layout.
//!
//! The converter writes packed little-endian records in this order: header,
//! bones, animations, channels, translation keys, rotation keys, scale keys.
//! Every record is made of 4-byte fields with no padding, so the records are
//! `Pod` and are read with unaligned copies straight out of the byte stream.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use tracing::debug;

use crate::animation::{
    Animation, AnimationAsset, AssetParts, Bone, Channel, KeyRange, Keyframe, ModelInfo,
};
use crate::error::{AssetError, FormatError};

pub const MODEL_MAGIC: u32 = u32::from_le_bytes(*b"MRWA");
pub const MODEL_VERSION: u32 = 1;

/// Marks a missing bone link or an unused key range start.
const NO_INDEX: u32 = u32::MAX;

/// Header flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModelFlags(pub u32);

impl ModelFlags {
    pub const HAS_ANIMATION: u32 = 1 << 0;
    pub const HAS_TANGENT: u32 = 1 << 1;
    pub const HAS_INDICES: u32 = 1 << 2;
    pub const STRUCT_OF_ARRAYS: u32 = 1 << 3;

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit == bit
    }

    pub fn has_animation(&self) -> bool {
        self.contains(Self::HAS_ANIMATION)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct HeaderRecord {
    magic: u32,
    version: u32,
    flags: u32,
    num_texcoord_channels: u32,
    num_meshes: u32,
    num_bones: u32,
    num_animations: u32,
    num_channels: u32,
    num_translation_frames: u32,
    num_rotation_frames: u32,
    num_scale_frames: u32,
    reserved: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct BoneRecord {
    id: u32,
    parent: u32,
    first_child: u32,
    next_sibling: u32,
    transform: [f32; 16],
    offset: [f32; 16],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct AnimationRecord {
    duration_ticks: f32,
    ticks_per_second: f32,
    num_channels: u32,
    start_channel: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ChannelRecord {
    bone_id: u32,
    start_translation: u32,
    num_translation: u32,
    start_rotation: u32,
    num_rotation: u32,
    start_scale: u32,
    num_scale: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct Vec3FrameRecord {
    time: f32,
    value: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct QuatFrameRecord {
    time: f32,
    value: [f32; 4],
}

fn optional_index(raw: u32) -> Option<u32> {
    (raw != NO_INDEX).then_some(raw)
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn table<R: Pod>(&mut self, count: u32, section: &'static str) -> Result<Vec<R>, FormatError> {
        let stride = std::mem::size_of::<R>();
        let available = self.bytes.len() - self.offset;
        let needed = (count as usize).saturating_mul(stride);
        if needed > available {
            return Err(FormatError::Truncated {
                section,
                needed,
                available,
            });
        }
        let slice = &self.bytes[self.offset..self.offset + needed];
        self.offset += needed;
        Ok(slice
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    fn finish(self) -> Result<(), FormatError> {
        match self.bytes.len() - self.offset {
            0 => Ok(()),
            extra => Err(FormatError::TrailingBytes(extra)),
        }
    }
}

impl AnimationAsset {
    /// Parse and validate a model file image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let mut reader = Reader { bytes, offset: 0 };
        let header: HeaderRecord = reader.table(1, "header")?[0];

        if header.magic != MODEL_MAGIC {
            return Err(FormatError::BadMagic(header.magic).into());
        }
        if header.version != MODEL_VERSION {
            return Err(FormatError::UnsupportedVersion(header.version).into());
        }
        let flags = ModelFlags(header.flags);
        let animated_tables = header.num_animations
            | header.num_channels
            | header.num_translation_frames
            | header.num_rotation_frames
            | header.num_scale_frames;
        if !flags.has_animation() && animated_tables != 0 {
            return Err(FormatError::MissingAnimationFlag.into());
        }

        let bones: Vec<BoneRecord> = reader.table(header.num_bones, "bone table")?;
        let animations: Vec<AnimationRecord> =
            reader.table(header.num_animations, "animation table")?;
        let channels: Vec<ChannelRecord> = reader.table(header.num_channels, "channel table")?;
        let translations: Vec<Vec3FrameRecord> =
            reader.table(header.num_translation_frames, "translation frames")?;
        let rotations: Vec<QuatFrameRecord> =
            reader.table(header.num_rotation_frames, "rotation frames")?;
        let scales: Vec<Vec3FrameRecord> = reader.table(header.num_scale_frames, "scale frames")?;
        reader.finish()?;

        let parts = AssetParts {
            info: ModelInfo {
                flags,
                num_texcoord_channels: header.num_texcoord_channels,
                num_meshes: header.num_meshes,
            },
            bones: bones
                .iter()
                .map(|b| Bone {
                    id: b.id,
                    parent: optional_index(b.parent),
                    first_child: optional_index(b.first_child),
                    next_sibling: optional_index(b.next_sibling),
                    transform: Mat4::from_cols_array(&b.transform),
                    offset: Mat4::from_cols_array(&b.offset),
                })
                .collect(),
            animations: animations
                .iter()
                .map(|a| Animation {
                    duration_ticks: a.duration_ticks,
                    ticks_per_second: a.ticks_per_second,
                    start_channel: a.start_channel,
                    num_channels: a.num_channels,
                })
                .collect(),
            channels: channels
                .iter()
                .map(|c| Channel {
                    bone: c.bone_id,
                    translation: KeyRange::new(c.start_translation, c.num_translation),
                    rotation: KeyRange::new(c.start_rotation, c.num_rotation),
                    scale: KeyRange::new(c.start_scale, c.num_scale),
                })
                .collect(),
            translation_keys: translations
                .iter()
                .map(|k| Keyframe::new(k.time, Vec3::from_array(k.value)))
                .collect(),
            rotation_keys: rotations
                .iter()
                .map(|k| Keyframe::new(k.time, Quat::from_array(k.value)))
                .collect(),
            scale_keys: scales
                .iter()
                .map(|k| Keyframe::new(k.time, Vec3::from_array(k.value)))
                .collect(),
        };

        let asset = AnimationAsset::from_parts(parts)?;
        debug!(
            "parsed model: {} bones, {} animations, {} channels",
            asset.num_bones(),
            asset.animations().len(),
            asset.channels().len()
        );
        Ok(asset)
    }

    /// Serialize into the model file layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let parts = self.parts();
        let mut flags = parts.info.flags.0;
        if !parts.animations.is_empty() {
            flags |= ModelFlags::HAS_ANIMATION;
        }
        let header = HeaderRecord {
            magic: MODEL_MAGIC,
            version: MODEL_VERSION,
            flags,
            num_texcoord_channels: parts.info.num_texcoord_channels,
            num_meshes: parts.info.num_meshes,
            num_bones: parts.bones.len() as u32,
            num_animations: parts.animations.len() as u32,
            num_channels: parts.channels.len() as u32,
            num_translation_frames: parts.translation_keys.len() as u32,
            num_rotation_frames: parts.rotation_keys.len() as u32,
            num_scale_frames: parts.scale_keys.len() as u32,
            reserved: 0,
        };

        let bones: Vec<BoneRecord> = parts
            .bones
            .iter()
            .map(|b| BoneRecord {
                id: b.id,
                parent: b.parent.unwrap_or(NO_INDEX),
                first_child: b.first_child.unwrap_or(NO_INDEX),
                next_sibling: b.next_sibling.unwrap_or(NO_INDEX),
                transform: b.transform.to_cols_array(),
                offset: b.offset.to_cols_array(),
            })
            .collect();
        let animations: Vec<AnimationRecord> = parts
            .animations
            .iter()
            .map(|a| AnimationRecord {
                duration_ticks: a.duration_ticks,
                ticks_per_second: a.ticks_per_second,
                num_channels: a.num_channels,
                start_channel: a.start_channel,
            })
            .collect();
        let channels: Vec<ChannelRecord> = parts
            .channels
            .iter()
            .map(|c| ChannelRecord {
                bone_id: c.bone,
                start_translation: c.translation.start,
                num_translation: c.translation.count,
                start_rotation: c.rotation.start,
                num_rotation: c.rotation.count,
                start_scale: c.scale.start,
                num_scale: c.scale.count,
            })
            .collect();
        let vec3_frames = |keys: &[Keyframe<Vec3>]| -> Vec<Vec3FrameRecord> {
            keys.iter()
                .map(|k| Vec3FrameRecord {
                    time: k.time,
                    value: k.value.to_array(),
                })
                .collect()
        };
        let rotations: Vec<QuatFrameRecord> = parts
            .rotation_keys
            .iter()
            .map(|k| QuatFrameRecord {
                time: k.time,
                value: k.value.to_array(),
            })
            .collect();

        let mut out = Vec::new();
        out.extend_from_slice(bytemuck::bytes_of(&header));
        out.extend_from_slice(bytemuck::cast_slice(&bones));
        out.extend_from_slice(bytemuck::cast_slice(&animations));
        out.extend_from_slice(bytemuck::cast_slice(&channels));
        out.extend_from_slice(bytemuck::cast_slice(&vec3_frames(&parts.translation_keys)));
        out.extend_from_slice(bytemuck::cast_slice(&rotations));
        out.extend_from_slice(bytemuck::cast_slice(&vec3_frames(&parts.scale_keys)));
        out
    }
}
