//! Infrastructure layer - Filesystem access, discovery and configuration

pub mod config;
pub mod registry;
pub mod store;

pub use config::LedctlConfig;
pub use registry::DeviceRegistry;
pub use store::{InMemoryAttributeStore, SysfsAttributeStore};
