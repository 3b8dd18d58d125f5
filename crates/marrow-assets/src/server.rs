use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::animation::AnimationAsset;
use crate::error::AssetError;
use crate::handle::{next_asset_id, AssetHandle, AssetId};

/// Central registry for animation assets.
///
/// Assets are handed out as `Arc`s: animation states keep the asset alive for
/// as long as they reference it, even after [`AssetServer::unload`].
pub struct AssetServer {
    base_path: PathBuf,
    animations: HashMap<AssetId, Arc<AnimationAsset>>,
    path_to_animation: HashMap<PathBuf, AssetHandle<AnimationAsset>>,
}

impl AssetServer {
    /// Create a new AssetServer rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("AssetServer created with base path: {}", base_path.display());
        Self {
            base_path,
            animations: HashMap::new(),
            path_to_animation: HashMap::new(),
        }
    }

    /// Resolve a relative asset path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Load a model file. Subsequent loads of the same path return the cached handle.
    pub fn load_animation(
        &mut self,
        path: &Path,
    ) -> Result<AssetHandle<AnimationAsset>, AssetError> {
        let full_path = self.resolve(path);

        if let Some(&handle) = self.path_to_animation.get(&full_path) {
            return Ok(handle);
        }

        let bytes = fs::read(&full_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => AssetError::NotFound(full_path.clone()),
            _ => AssetError::Io(full_path.clone(), e),
        })?;
        let asset = AnimationAsset::from_bytes(&bytes)?;
        debug!(
            "Loaded '{}' ({} bones, {} animations)",
            full_path.display(),
            asset.num_bones(),
            asset.animations().len()
        );

        let handle = self.insert(asset);
        self.path_to_animation.insert(full_path, handle);
        Ok(handle)
    }

    /// Register an asset built in memory.
    pub fn insert(&mut self, asset: AnimationAsset) -> AssetHandle<AnimationAsset> {
        let id = next_asset_id();
        self.animations.insert(id, Arc::new(asset));
        AssetHandle::new(id)
    }

    /// Shared reference to a loaded asset.
    pub fn get(&self, handle: AssetHandle<AnimationAsset>) -> Option<Arc<AnimationAsset>> {
        self.animations.get(&handle.id()).cloned()
    }

    pub fn is_loaded(&self, handle: AssetHandle<AnimationAsset>) -> bool {
        self.animations.contains_key(&handle.id())
    }

    /// Drop the server's reference. Returns `false` if the handle was unknown.
    pub fn unload(&mut self, handle: AssetHandle<AnimationAsset>) -> bool {
        self.path_to_animation.retain(|_, cached| *cached != handle);
        self.animations.remove(&handle.id()).is_some()
    }

    /// The base path this server resolves relative paths against.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AssetParts, Bone};

    fn single_bone_asset() -> AnimationAsset {
        AnimationAsset::from_parts(AssetParts {
            bones: vec![Bone::root(0)],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn missing_file_returns_error() {
        let mut server = AssetServer::new("/nonexistent");
        let result = server.load_animation(Path::new("does_not_exist.mdl"));
        match result.unwrap_err() {
            AssetError::NotFound(_) => {}
            other => panic!("expected NotFound, got: {:?}", other),
        }
    }

    #[test]
    fn resolve_relative_path() {
        let server = AssetServer::new("/home/user/assets");
        assert_eq!(
            server.resolve(Path::new("models/rig.mdl")),
            PathBuf::from("/home/user/assets/models/rig.mdl")
        );
        assert_eq!(
            server.resolve(Path::new("/absolute/rig.mdl")),
            PathBuf::from("/absolute/rig.mdl")
        );
    }

    #[test]
    fn load_is_cached_by_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rig.mdl"), single_bone_asset().to_bytes()).unwrap();

        let mut server = AssetServer::new(dir.path());
        let a = server.load_animation(Path::new("rig.mdl")).unwrap();
        let b = server.load_animation(&dir.path().join("rig.mdl")).unwrap();
        assert_eq!(a, b);
        assert_eq!(server.get(a).unwrap().num_bones(), 1);
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.mdl"), b"not a model").unwrap();

        let mut server = AssetServer::new(dir.path());
        assert!(matches!(
            server.load_animation(Path::new("bad.mdl")),
            Err(AssetError::Format(_))
        ));
    }

    #[test]
    fn unload_keeps_outstanding_references() {
        let mut server = AssetServer::new("/unused");
        let handle = server.insert(single_bone_asset());
        let shared = server.get(handle).unwrap();

        assert!(server.unload(handle));
        assert!(!server.is_loaded(handle));
        assert!(!server.unload(handle));
        assert_eq!(shared.num_bones(), 1);
    }
}
