use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tracing::info;

use domain::{DomainError, Encoder, MorseEncoder, Result};

/// Operations of [`crate::LedDevice`]; an encoder may not shadow any of them.
/// `morse` is not listed: it is taken by the built-in encoder instead.
pub const RESERVED_NAMES: &[&str] = &[
    "set_brightness",
    "turn_on",
    "turn_off",
    "set_trigger",
    "blink",
    "reset",
    "current_value",
    "triggers",
    "bounds",
    "encode",
];

/// Encoders by name, shared by every handle of a controller.
///
/// Handles look encoders up on each call, so an encoder registered after a
/// handle was opened is immediately usable through it.
#[derive(Default)]
pub struct EncoderRegistry {
    encoders: DashMap<String, Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `morse` encoder
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry
            .encoders
            .insert("morse".to_string(), Arc::new(MorseEncoder));
        registry
    }

    /// Add `encoder` under `name`.
    ///
    /// Fails if `name` is empty, reserved, or already taken; an existing
    /// encoder is never replaced.
    pub fn register(&self, name: &str, encoder: impl Encoder + 'static) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DomainError::Registration(
                "Encoder name cannot be empty".to_string(),
            ));
        }
        if RESERVED_NAMES.contains(&name) {
            return Err(DomainError::Registration(format!(
                "'{}' is a built-in operation",
                name
            )));
        }

        match self.encoders.entry(name.to_string()) {
            Entry::Occupied(_) => Err(DomainError::Registration(format!(
                "Encoder '{}' already registered",
                name
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(encoder));
                info!(encoder = %name, "Registered encoder");
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Encoder>> {
        self.encoders.get(name).map(|e| e.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.encoders.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.encoders.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderRegistry")
            .field("encoders", &self.names())
            .finish()
    }
}
