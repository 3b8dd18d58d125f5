//! Asset file on disk through to skinning matrices, the way a game frame
//! loop drives it.

use std::fs;

use glam::{Mat4, Vec3};
use marrow_anim::{AnimationConfig, AnimationState, AnimationSystem};
use marrow_assets::{
    Animation, AnimationAsset, AssetParts, AssetServer, Bone, Channel, KeyRange, Keyframe,
};
use marrow_core::{GameTime, TimeConfig};
use marrow_ecs::World;

/// Root rises one unit over one second; the child sits one unit along +X
/// in bind pose.
fn arm() -> AnimationAsset {
    let mut root = Bone::root(0);
    root.first_child = Some(1);
    let child = Bone::root(1)
        .with_parent(0)
        .with_transform(Mat4::from_translation(Vec3::X))
        .with_offset(Mat4::from_translation(-Vec3::X));

    AnimationAsset::from_parts(AssetParts {
        bones: vec![root, child],
        animations: vec![
            Animation {
                duration_ticks: 1.0,
                ticks_per_second: 1.0,
                start_channel: 0,
                num_channels: 1,
            },
            Animation {
                duration_ticks: 2.0,
                ticks_per_second: 2.0,
                start_channel: 1,
                num_channels: 1,
            },
        ],
        channels: vec![
            Channel {
                bone: 0,
                translation: KeyRange::new(0, 2),
                rotation: KeyRange::EMPTY,
                scale: KeyRange::EMPTY,
            },
            Channel {
                bone: 1,
                translation: KeyRange::EMPTY,
                rotation: KeyRange::EMPTY,
                scale: KeyRange::new(0, 1),
            },
        ],
        translation_keys: vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(1.0, Vec3::Y),
        ],
        scale_keys: vec![Keyframe::new(0.0, Vec3::splat(2.0))],
        ..Default::default()
    })
    .unwrap()
}

fn assert_translation(matrix: &Mat4, expected: Vec3) {
    let actual = matrix.col(3).truncate();
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "expected {expected}, got {actual}"
    );
}

#[test]
fn loaded_asset_animates_through_world() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("arm.mrw"), arm().to_bytes()).unwrap();

    let mut assets = AssetServer::new(dir.path());
    let handle = assets.load_animation("arm.mrw".as_ref()).unwrap();
    let model = assets.get(handle).unwrap();

    let mut world = World::new();
    world.register::<AnimationState>(16);
    let entity = world.spawn();

    let mut system = AnimationSystem::new(AnimationConfig::default());
    let pool = world.pool_mut::<AnimationState>().unwrap();
    system.attach(pool, entity, model).unwrap();

    let mut time = GameTime::new(TimeConfig::default());
    let pool = world.pool_mut::<AnimationState>().unwrap();
    for _ in 0..2 {
        time.update(0.25);
        system.update(pool, time.delta_time);
    }

    let mut palettes = Vec::new();
    let stats = system.resolve(pool, |e, palette| palettes.push((e, palette.to_vec())));
    assert_eq!(stats.resolved, 1);
    assert_eq!(palettes[0].0, entity);

    let palette = &palettes[0].1;
    assert_translation(&palette[0], Vec3::new(0.0, 0.5, 0.0));
    // Child follows its parent; its offset cancels the bind translation.
    assert_translation(&palette[1], Vec3::new(0.0, 0.5, 0.0));
}

#[test]
fn cross_fade_settles_on_new_clip() {
    let mut assets = AssetServer::new(".");
    let handle = assets.insert(arm());
    let model = assets.get(handle).unwrap();

    let mut state = AnimationState::with_model(model);
    state.update_timing(0.5);
    state.cross_fade(1, 0.5);

    let mut during = [Mat4::ZERO; 2];
    state.update_timing(0.25);
    state.fill_bone_matrices(&mut during).unwrap();
    assert!(state.is_blending());

    state.update_timing(0.25);
    let mut after = [Mat4::ZERO; 2];
    state.fill_bone_matrices(&mut after).unwrap();
    assert!(!state.is_blending());

    // Clip 1 leaves the root at bind pose. Its child channel replaces the
    // whole local transform, so the bind translation is gone and only the
    // scaled offset remains.
    assert_translation(&after[0], Vec3::ZERO);
    let child_x = after[1].transform_vector3(Vec3::X);
    assert!((child_x.length() - 2.0).abs() < 1e-5);
    assert_translation(&after[1], Vec3::new(-2.0, 0.0, 0.0));

    // Halfway through the fade the root is halfway back to bind pose from
    // where the old clip left it.
    assert_translation(&during[0], Vec3::new(0.0, 0.375, 0.0));
}

#[test]
fn despawn_releases_state_but_not_asset() {
    let mut assets = AssetServer::new(".");
    let handle = assets.insert(arm());
    let model = assets.get(handle).unwrap();

    let mut world = World::new();
    world.register::<AnimationState>(4);
    let entity = world.spawn();
    let system = AnimationSystem::default();
    system
        .attach(world.pool_mut().unwrap(), entity, model.clone())
        .unwrap();
    assert_eq!(std::sync::Arc::strong_count(&model), 3);

    world.despawn(entity);
    assert!(!world.has::<AnimationState>(entity));
    assert_eq!(std::sync::Arc::strong_count(&model), 2);

    assert!(assets.unload(handle));
    assert_eq!(model.num_bones(), 2);
}
