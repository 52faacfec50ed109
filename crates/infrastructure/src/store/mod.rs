pub mod memory;
pub mod sysfs;

pub use memory::{InMemoryAttributeStore, WriteRecord};
pub use sysfs::SysfsAttributeStore;
