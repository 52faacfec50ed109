use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::attribute::{AttributeStore, names};
use crate::error::{DomainError, Result};

/// Brightness range of a LED.
///
/// `max` comes from `max_brightness` and never changes for the lifetime of a
/// handle. The current level is not part of this value: it is read live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrightnessBounds {
    pub min: i64,
    pub max: i64,
}

impl BrightnessBounds {
    pub fn new(max: i64) -> Self {
        Self {
            min: 0,
            max: max.max(0),
        }
    }

    /// Read `max_brightness` of the device at `location`
    pub fn load(store: &dyn AttributeStore, location: &Path) -> Result<Self> {
        let raw = store.read(location, names::MAX_BRIGHTNESS)?;
        let max = raw.parse::<i64>().map_err(|_| {
            DomainError::Configuration(format!(
                "Invalid max_brightness '{}' in {}",
                raw,
                location.display()
            ))
        })?;
        Ok(Self::new(max))
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }
}

/// Parse a raw brightness reading
pub fn parse_brightness(raw: &str, location: &Path) -> Result<i64> {
    raw.parse::<i64>().map_err(|_| {
        DomainError::io(
            location.join(names::BRIGHTNESS).display(),
            format!("not an integer: '{raw}'"),
        )
    })
}

/// Supported triggers of a LED and the active one.
///
/// The kernel lists triggers separated by spaces and marks the active one
/// with brackets, e.g. `none [timer] heartbeat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInfo {
    pub all: Vec<String>,
    pub current: Option<String>,
}

impl TriggerInfo {
    pub fn parse(raw: &str) -> Self {
        let mut current = None;
        let all = raw
            .split_whitespace()
            .map(|label| match label.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                Some(active) => {
                    if current.is_none() {
                        current = Some(active.to_string());
                    }
                    active.to_string()
                }
                None => label.to_string(),
            })
            .collect();

        Self { all, current }
    }

    pub fn load(store: &dyn AttributeStore, location: &Path) -> Result<Self> {
        store
            .read(location, names::TRIGGER)
            .map(|raw| Self::parse(&raw))
    }

    pub fn supports(&self, trigger: &str) -> bool {
        self.all.iter().any(|t| t == trigger)
    }
}
