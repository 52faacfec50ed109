use async_trait::async_trait;
use std::path::Path;

use crate::error::DomainError;

/// Attribute file names of a LED class device
pub mod names {
    pub const BRIGHTNESS: &str = "brightness";
    pub const MAX_BRIGHTNESS: &str = "max_brightness";
    pub const TRIGGER: &str = "trigger";
}

/// Key/value access to the attribute files of a device directory.
///
/// Reads are blocking: they back live properties such as the current
/// brightness. Writes are awaited by the write queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Read an attribute, trimmed of surrounding whitespace
    fn read(&self, device: &Path, attribute: &str) -> Result<String, DomainError>;

    /// Replace the content of an attribute
    async fn write(&self, device: &Path, attribute: &str, value: &str) -> Result<(), DomainError>;
}

/// Lists the LED identifiers found under a root directory.
///
/// Never fails: an unreadable or missing root has no LEDs.
pub trait DeviceDiscovery: Send + Sync {
    fn discover(&self, root: &Path) -> Vec<String>;
}
