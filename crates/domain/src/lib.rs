//! Domain layer - LED control types with no I/O of their own
//!
//! This crate contains:
//! - Value objects (BlinkDescriptor, BrightnessBounds, TriggerInfo)
//! - Errors shared by every layer
//! - Ports implemented elsewhere (AttributeStore, DeviceDiscovery)
//! - The encoder contract and the reference morse encoder

pub mod attribute;
pub mod blink;
pub mod encoder;
pub mod error;
pub mod led;

// Re-export commonly used types
pub use attribute::{AttributeStore, DeviceDiscovery};
pub use blink::{BlinkDescriptor, BlinkTiming, Blinks};
pub use encoder::{EncodeError, EncodeResult, Encoder, Encoding, MorseEncoder};
pub use error::{DomainError, Result};
pub use led::{BrightnessBounds, TriggerInfo};
