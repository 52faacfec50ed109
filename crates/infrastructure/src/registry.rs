use dashmap::DashMap;
use domain::attribute::{DeviceDiscovery, names};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds LED class devices under a root directory.
///
/// Scans are cached per root until [`DeviceRegistry::invalidate`],
/// [`DeviceRegistry::refresh`] or [`DeviceRegistry::clear`] is called.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    cache: DashMap<PathBuf, Arc<[String]>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rescan `root`, replacing any cached result
    pub fn refresh(&self, root: &Path) -> Vec<String> {
        self.invalidate(root);
        self.discover(root)
    }

    /// Forget the cached scan of `root`. Returns whether one was cached.
    pub fn invalidate(&self, root: &Path) -> bool {
        self.cache.remove(root).is_some()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn is_cached(&self, root: &Path) -> bool {
        self.cache.contains_key(root)
    }
}

impl DeviceDiscovery for DeviceRegistry {
    fn discover(&self, root: &Path) -> Vec<String> {
        if let Some(hit) = self.cache.get(root) {
            return hit.to_vec();
        }

        let leds = scan(root);
        info!(root = %root.display(), count = leds.len(), "Discovered LEDs");
        self.cache.insert(root.to_path_buf(), leds.clone().into());
        leds
    }
}

/// Directories holding both `trigger` and `brightness` look like LEDs
fn scan(root: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "LED root not readable");
            return Vec::new();
        }
    };

    let mut leds: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            // sysfs exposes LEDs as symlinks, so follow them
            let path = entry.path();
            path.is_dir()
                && path.join(names::TRIGGER).is_file()
                && path.join(names::BRIGHTNESS).is_file()
        })
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();

    leds.sort();
    leds
}
