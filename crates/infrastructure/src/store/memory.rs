use async_trait::async_trait;
use domain::attribute::{AttributeStore, DeviceDiscovery, names};
use domain::error::DomainError;
use domain::led::TriggerInfo;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A write that reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub path: PathBuf,
    pub value: String,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    writes: Vec<WriteRecord>,
    delays: VecDeque<Duration>,
    failing: HashSet<String>,
}

/// Attribute store kept in memory, with fault and latency injection.
///
/// Clones share the same state, so a test can keep one clone for inspection
/// and hand another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the attribute files of a LED class device under `root`
    pub fn add_led(&self, root: &Path, id: &str, max_brightness: i64, triggers: &[&str]) {
        let dir = root.join(id);
        let mut labels: Vec<String> = triggers.iter().map(|t| t.to_string()).collect();
        if let Some(first) = labels.first_mut() {
            *first = format!("[{first}]");
        }

        self.set(&dir, names::BRIGHTNESS, "0");
        self.set(&dir, names::MAX_BRIGHTNESS, &max_brightness.to_string());
        self.set(&dir, names::TRIGGER, &labels.join(" "));
    }

    /// Set an attribute without recording a write
    pub fn set(&self, device: &Path, attribute: &str, value: &str) {
        self.lock()
            .files
            .insert(device.join(attribute), value.to_string());
    }

    pub fn get(&self, device: &Path, attribute: &str) -> Option<String> {
        self.lock().files.get(&device.join(attribute)).cloned()
    }

    /// Writes in the order they reached the store
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.clone()
    }

    /// Values written to one attribute, oldest first
    pub fn written(&self, device: &Path, attribute: &str) -> Vec<String> {
        let path = device.join(attribute);
        self.lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .map(|w| w.value.clone())
            .collect()
    }

    /// Delay the next write by `delay`; calls queue up, one per write
    pub fn delay_next_write(&self, delay: Duration) {
        self.lock().delays.push_back(delay);
    }

    /// Make every write to `attribute` fail until [`Self::heal`] is called
    pub fn fail_writes_to(&self, attribute: &str) {
        self.lock().failing.insert(attribute.to_string());
    }

    pub fn heal(&self) {
        self.lock().failing.clear();
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AttributeStore for InMemoryAttributeStore {
    fn read(&self, device: &Path, attribute: &str) -> Result<String, DomainError> {
        let path = device.join(attribute);
        self.lock()
            .files
            .get(&path)
            .map(|value| value.trim().to_string())
            .ok_or_else(|| DomainError::io(path.display(), "No such file or directory"))
    }

    async fn write(&self, device: &Path, attribute: &str, value: &str) -> Result<(), DomainError> {
        let delay = self.lock().delays.pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let path = device.join(attribute);
        let mut state = self.lock();
        if state.failing.contains(attribute) || !state.files.contains_key(&path) {
            return Err(DomainError::io(path.display(), "Permission denied"));
        }

        let stored = if attribute == names::TRIGGER {
            // Like the kernel: keep the list, move the brackets
            let current = state.files.get(&path).cloned().unwrap_or_default();
            let info = TriggerInfo::parse(&current);
            if !info.supports(value) {
                return Err(DomainError::io(path.display(), "Invalid argument"));
            }
            info.all
                .iter()
                .map(|t| if t == value { format!("[{t}]") } else { t.clone() })
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            value.to_string()
        };

        state.files.insert(path.clone(), stored);
        state.writes.push(WriteRecord {
            path,
            value: value.to_string(),
        });
        Ok(())
    }
}

impl DeviceDiscovery for InMemoryAttributeStore {
    fn discover(&self, root: &Path) -> Vec<String> {
        let state = self.lock();
        let mut leds: Vec<String> = state
            .files
            .keys()
            .filter(|path| path.ends_with(names::TRIGGER))
            .filter_map(|path| path.parent())
            .filter(|dir| dir.parent() == Some(root))
            .filter(|dir| state.files.contains_key(&dir.join(names::BRIGHTNESS)))
            .filter_map(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        leds.sort();
        leds.dedup();
        leds
    }
}
