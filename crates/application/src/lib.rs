//! Application layer - Ordered execution of LED operations

pub mod blink_engine;
pub mod controller;
pub mod device;
pub mod encoders;
pub mod queue;
pub mod write_queue;

pub use blink_engine::BlinkEngine;
pub use controller::{ControllerSettings, LedController};
pub use device::LedDevice;
pub use encoders::EncoderRegistry;
pub use queue::{Completion, Pending};
pub use write_queue::WriteQueue;
