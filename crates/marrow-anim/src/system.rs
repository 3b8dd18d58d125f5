use std::sync::Arc;

use glam::Mat4;
use marrow_assets::AnimationAsset;
use marrow_core::GameTime;
use marrow_ecs::{ComponentPool, Entity, Handle, PoolError};
use tracing::warn;

use crate::config::AnimationConfig;
use crate::error::AnimationError;
use crate::state::AnimationState;

/// Outcome of one [`AnimationSystem::resolve`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub resolved: usize,
    pub skipped: usize,
}

/// Drives every [`AnimationState`] in a pool once per frame.
pub struct AnimationSystem {
    config: AnimationConfig,
    palette: Vec<Mat4>,
}

impl AnimationSystem {
    pub fn new(config: AnimationConfig) -> Self {
        let palette = Vec::with_capacity(config.max_bones);
        Self { config, palette }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Give `entity` an animation state bound to `model`, playing animation 0
    /// at the configured default speed.
    pub fn attach(
        &self,
        pool: &mut ComponentPool<AnimationState>,
        entity: Entity,
        model: Arc<AnimationAsset>,
    ) -> Result<Handle<AnimationState>, PoolError> {
        let handle = pool.create(entity)?;
        let state = &mut pool[handle];
        state.set_model(Some(model));
        state.set_playback_speed(self.config.default_playback_speed);
        Ok(handle)
    }

    /// Cross-fade using the configured default duration.
    pub fn cross_fade_default(&self, state: &mut AnimationState, animation: u32) {
        state.cross_fade(animation, self.config.default_cross_fade);
    }

    /// Advance every state's clocks by `dt` seconds.
    pub fn update(&self, pool: &mut ComponentPool<AnimationState>, dt: f32) {
        for state in pool.components_mut() {
            state.update_timing(dt);
        }
    }

    /// Resolve every state's pose and hand it to `submit`.
    ///
    /// An entity whose data cannot be resolved is logged and skipped; the
    /// rest of the pool is still processed.
    pub fn resolve<F>(&mut self, pool: &ComponentPool<AnimationState>, mut submit: F) -> ResolveStats
    where
        F: FnMut(Entity, &[Mat4]),
    {
        let mut stats = ResolveStats::default();
        for (entity, state) in pool.iter() {
            match self.resolve_one(state) {
                Ok(bones) => {
                    submit(entity, &self.palette[..bones]);
                    stats.resolved += 1;
                }
                Err(e) => {
                    warn!("skipping animation for {}: {}", entity, e);
                    stats.skipped += 1;
                }
            }
        }
        stats
    }

    fn resolve_one(&mut self, state: &AnimationState) -> Result<usize, AnimationError> {
        let bones = state.model().map_or(0, |model| model.num_bones());
        if bones > self.config.max_bones {
            return Err(AnimationError::TooManyBones {
                bones,
                max: self.config.max_bones,
            });
        }
        self.palette.resize(bones, Mat4::IDENTITY);
        state.fill_bone_matrices_with(&mut self.palette, self.config.blend_mode)
    }

    /// One frame: advance by the clock's scaled delta, then resolve.
    pub fn tick<F>(
        &mut self,
        pool: &mut ComponentPool<AnimationState>,
        time: &GameTime,
        submit: F,
    ) -> ResolveStats
    where
        F: FnMut(Entity, &[Mat4]),
    {
        self.update(pool, time.delta_time);
        self.resolve(pool, submit)
    }
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use marrow_assets::{Animation, AssetParts, Bone, Channel, KeyRange, Keyframe};
    use marrow_core::TimeConfig;
    use marrow_ecs::EntityAllocator;

    fn walking_asset(bones: u32) -> Arc<AnimationAsset> {
        let bone_table = (0..bones).map(Bone::root).collect();
        Arc::new(
            AnimationAsset::from_parts(AssetParts {
                bones: bone_table,
                animations: vec![Animation {
                    duration_ticks: 10.0,
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
                    Keyframe::new(10.0, Vec3::new(10.0, 0.0, 0.0)),
                ],
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[test]
    fn attach_applies_configured_speed() {
        let system = AnimationSystem::new(AnimationConfig {
            default_playback_speed: 0.5,
            ..Default::default()
        });
        let mut entities = EntityAllocator::new();
        let mut pool = ComponentPool::with_capacity(4);
        let e = entities.allocate();

        let handle = system.attach(&mut pool, e, walking_asset(1)).unwrap();
        assert_eq!(pool[handle].playback_speed(), 0.5);
        assert!(pool[handle].model().is_some());
    }

    #[test]
    fn attach_reports_full_pool() {
        let system = AnimationSystem::default();
        let mut entities = EntityAllocator::new();
        let mut pool = ComponentPool::with_capacity(1);
        system.attach(&mut pool, entities.allocate(), walking_asset(1)).unwrap();

        let err = system
            .attach(&mut pool, entities.allocate(), walking_asset(1))
            .unwrap_err();
        assert_eq!(err, PoolError::CapacityExceeded { capacity: 1 });
    }

    #[test]
    fn cross_fade_default_uses_configured_duration() {
        let system = AnimationSystem::new(AnimationConfig {
            default_cross_fade: 0.5,
            ..Default::default()
        });
        let mut state = AnimationState::default();
        system.cross_fade_default(&mut state, 1);
        state.update_timing(0.25);
        assert_eq!(state.cross_fade_factor(), 0.5);
    }

    #[test]
    fn tick_advances_and_submits_every_entity() {
        let mut system = AnimationSystem::default();
        let mut entities = EntityAllocator::new();
        let mut pool = ComponentPool::with_capacity(4);
        let a = entities.allocate();
        let b = entities.allocate();
        system.attach(&mut pool, a, walking_asset(2)).unwrap();
        let hb = system.attach(&mut pool, b, walking_asset(2)).unwrap();
        pool[hb].set_playback_speed(2.0);

        let mut time = GameTime::new(TimeConfig::default());
        time.update(0.1);

        let mut submitted = Vec::new();
        let stats = system.tick(&mut pool, &time, |entity, palette| {
            assert_eq!(palette.len(), 2);
            submitted.push((entity, palette[0].col(3).x));
        });

        assert_eq!(stats, ResolveStats { resolved: 2, skipped: 0 });
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0].0, a);
        assert!((submitted[0].1 - 0.1).abs() < 1e-5);
        assert_eq!(submitted[1].0, b);
        assert!((submitted[1].1 - 0.2).abs() < 1e-5);
    }

    #[test]
    fn broken_entities_are_skipped() {
        let mut system = AnimationSystem::new(AnimationConfig {
            max_bones: 2,
            ..Default::default()
        });
        let mut entities = EntityAllocator::new();
        let mut pool: ComponentPool<AnimationState> = ComponentPool::with_capacity(4);

        let unbound = entities.allocate();
        pool.create(unbound).unwrap();
        let oversized = entities.allocate();
        system.attach(&mut pool, oversized, walking_asset(3)).unwrap();
        let bad_clip = entities.allocate();
        let handle = system.attach(&mut pool, bad_clip, walking_asset(1)).unwrap();
        pool[handle].play(7);
        let good = entities.allocate();
        system.attach(&mut pool, good, walking_asset(2)).unwrap();

        let mut seen = Vec::new();
        let stats = system.resolve(&pool, |entity, _| seen.push(entity));
        assert_eq!(stats, ResolveStats { resolved: 1, skipped: 3 });
        assert_eq!(seen, vec![good]);
    }

    #[test]
    fn paused_clock_holds_pose() {
        let mut system = AnimationSystem::default();
        let mut entities = EntityAllocator::new();
        let mut pool = ComponentPool::with_capacity(1);
        let handle = system
            .attach(&mut pool, entities.allocate(), walking_asset(1))
            .unwrap();

        let mut time = GameTime::new(TimeConfig::default());
        time.pause();
        time.update(0.5);
        system.tick(&mut pool, &time, |_, _| {});
        assert_eq!(pool[handle].current_time(), 0.0);
    }
}
