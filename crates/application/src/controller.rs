use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use domain::{AttributeStore, BrightnessBounds, DeviceDiscovery, DomainError, Encoder, Result};
use infrastructure::{DeviceRegistry, LedctlConfig, SysfsAttributeStore};

use crate::device::LedDevice;
use crate::encoders::EncoderRegistry;

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Directory holding one sub-directory per LED
    pub root: PathBuf,
    /// Rate applied to blinks that do not carry their own
    pub rate: f64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&LedctlConfig::default())
    }
}

impl From<&LedctlConfig> for ControllerSettings {
    fn from(config: &LedctlConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root),
            rate: config.rate,
        }
    }
}

/// Opens LED handles and owns what they share: the attribute store, device
/// discovery and the encoder registry.
pub struct LedController {
    store: Arc<dyn AttributeStore>,
    discovery: Arc<dyn DeviceDiscovery>,
    encoders: Arc<EncoderRegistry>,
    settings: ControllerSettings,
}

impl LedController {
    pub fn new(
        store: Arc<dyn AttributeStore>,
        discovery: Arc<dyn DeviceDiscovery>,
        settings: ControllerSettings,
    ) -> Self {
        Self {
            store,
            discovery,
            encoders: Arc::new(EncoderRegistry::with_defaults()),
            settings,
        }
    }

    /// Controller over real sysfs-style LED directories
    pub fn sysfs(settings: ControllerSettings) -> Self {
        Self::new(
            Arc::new(SysfsAttributeStore::new()),
            Arc::new(DeviceRegistry::new()),
            settings,
        )
    }

    /// Replace the encoder registry, e.g. to share one between controllers
    pub fn with_encoders(mut self, encoders: Arc<EncoderRegistry>) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn root(&self) -> &Path {
        &self.settings.root
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn encoders(&self) -> &Arc<EncoderRegistry> {
        &self.encoders
    }

    /// LED identifiers available under the root
    pub fn discover(&self) -> Vec<String> {
        self.discovery.discover(&self.settings.root)
    }

    pub fn register_encoder(&self, name: &str, encoder: impl Encoder + 'static) -> Result<()> {
        self.encoders.register(name, encoder)
    }

    /// Open the LED `id`, or the only LED present when `id` is `None`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn open(&self, id: Option<&str>) -> Result<LedDevice> {
        let available = self.discover();
        let root = self.settings.root.display();

        let id = match id {
            Some(id) => id.to_string(),
            None if available.len() == 1 => available[0].clone(),
            None => {
                return Err(DomainError::Configuration(format!(
                    "No LED identifier given and {} LEDs available in {}",
                    available.len(),
                    root
                )));
            }
        };

        if !available.contains(&id) {
            return Err(DomainError::Configuration(format!(
                "No such LED: '{}' in {}",
                id, root
            )));
        }

        let location = self.settings.root.join(&id);
        let bounds = BrightnessBounds::load(self.store.as_ref(), &location)?;
        info!(device_id = %id, "Opening LED");

        Ok(LedDevice::new(
            &id,
            location,
            bounds,
            self.store.clone(),
            self.encoders.clone(),
            self.settings.rate,
        ))
    }
}

impl std::fmt::Debug for LedController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedController")
            .field("settings", &self.settings)
            .field("encoders", &self.encoders)
            .finish()
    }
}
