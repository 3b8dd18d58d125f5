use serde::{Deserialize, Serialize};

/// How a cross-fade mixes the outgoing pose into the incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Element-wise matrix lerp. Cheap, but large rotation deltas shrink
    /// the intermediate pose.
    #[default]
    Matrix,
    /// Decompose both poses and blend translation, rotation and scale separately.
    Decomposed,
}

/// Animation playback settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Playback speed given to newly attached states.
    pub default_playback_speed: f32,
    /// Cross-fade duration in seconds used by `AnimationSystem::cross_fade_default`.
    pub default_cross_fade: f32,
    /// Largest skeleton the system will resolve.
    pub max_bones: usize,
    pub blend_mode: BlendMode,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            default_playback_speed: 1.0,
            default_cross_fade: 0.25,
            max_bones: 128,
            blend_mode: BlendMode::Matrix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnimationConfig::default();
        assert_eq!(config.default_playback_speed, 1.0);
        assert_eq!(config.max_bones, 128);
        assert_eq!(config.blend_mode, BlendMode::Matrix);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AnimationConfig = toml::from_str(
            r#"
            max_bones = 64
            blend_mode = "decomposed"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_bones, 64);
        assert_eq!(config.blend_mode, BlendMode::Decomposed);
        assert_eq!(config.default_cross_fade, 0.25);
    }
}
