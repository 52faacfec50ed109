use async_trait::async_trait;
use domain::attribute::AttributeStore;
use domain::error::DomainError;
use std::path::Path;
use tracing::{debug, error};

/// Attribute files on a real filesystem, e.g. `/sys/class/leds/<led>/brightness`
#[derive(Debug, Clone, Copy, Default)]
pub struct SysfsAttributeStore;

impl SysfsAttributeStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AttributeStore for SysfsAttributeStore {
    fn read(&self, device: &Path, attribute: &str) -> Result<String, DomainError> {
        let path = device.join(attribute);
        std::fs::read_to_string(&path)
            .map(|content| content.trim().to_string())
            .map_err(|e| DomainError::io(path.display(), e))
    }

    async fn write(&self, device: &Path, attribute: &str, value: &str) -> Result<(), DomainError> {
        let path = device.join(attribute);
        debug!(path = %path.display(), value = %value, "Writing attribute");

        // Open, write, close: sysfs attributes take the whole value in one write
        tokio::fs::write(&path, value).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write attribute");
            DomainError::io(path.display(), e)
        })
    }
}
