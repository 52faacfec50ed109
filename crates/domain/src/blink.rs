use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DUTY_PERCENT: f64 = 50.0;
pub const DEFAULT_PERIOD_MS: f64 = 1000.0;

/// Longest phase a cycle can have; longer phases are capped to it
pub const MAX_PHASE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// One on/off cycle of a LED.
///
/// `rate` speeds up (> 1) or slows down (< 1) the cycle: the effective period
/// is `period_ms / rate`. When `rate` is absent the executing engine's default
/// rate applies. `duty_percent` is the share of the period the LED stays lit.
///
/// Out-of-range values are tolerated here and sanitised by [`BlinkDescriptor::timing`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkDescriptor {
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default = "default_duty", alias = "for")]
    pub duty_percent: f64,
    #[serde(default = "default_period", alias = "of")]
    pub period_ms: f64,
}

fn default_duty() -> f64 {
    DEFAULT_DUTY_PERCENT
}

fn default_period() -> f64 {
    DEFAULT_PERIOD_MS
}

impl Default for BlinkDescriptor {
    fn default() -> Self {
        Self {
            rate: None,
            duty_percent: DEFAULT_DUTY_PERCENT,
            period_ms: DEFAULT_PERIOD_MS,
        }
    }
}

impl BlinkDescriptor {
    pub fn new(duty_percent: f64, period_ms: f64) -> Self {
        Self {
            rate: None,
            duty_percent,
            period_ms,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_duty(mut self, duty_percent: f64) -> Self {
        self.duty_percent = duty_percent;
        self
    }

    pub fn with_period(mut self, period_ms: f64) -> Self {
        self.period_ms = period_ms;
        self
    }

    /// True when the LED is never lit during this cycle (a pause).
    pub fn is_dark(&self) -> bool {
        self.duty_percent == 0.0
    }

    /// Resolve the on/off durations of this cycle.
    ///
    /// `default_rate` replaces a missing, non-positive or non-finite `rate`;
    /// when it is unusable itself, 1 is used.
    pub fn timing(&self, default_rate: f64) -> BlinkTiming {
        let fallback = if default_rate.is_finite() && default_rate > 0.0 {
            default_rate
        } else {
            1.0
        };
        let rate = self
            .rate
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(fallback);

        let duty = if self.duty_percent.is_finite() && self.duty_percent >= 0.0 {
            self.duty_percent.min(100.0)
        } else {
            DEFAULT_DUTY_PERCENT
        };
        let period = if self.period_ms.is_finite() && self.period_ms >= 0.0 {
            self.period_ms
        } else {
            DEFAULT_PERIOD_MS
        };

        let period_ms = period / rate;
        let on_ms = period_ms * duty / 100.0;
        let off_ms = period_ms * (100.0 - duty) / 100.0;

        BlinkTiming {
            on: millis(on_ms),
            off: millis(off_ms),
        }
    }
}

/// Zero for NaN and non-positive values, capped at [`MAX_PHASE`]
fn millis(ms: f64) -> Duration {
    if ms.is_nan() || ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(ms / 1000.0).map_or(MAX_PHASE, |d| d.min(MAX_PHASE))
}

/// Resolved durations of a single blink cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTiming {
    pub on: Duration,
    pub off: Duration,
}

impl BlinkTiming {
    pub fn total(&self) -> Duration {
        self.on + self.off
    }
}

/// Output of an encoder: either a single cycle or an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Blinks {
    One(BlinkDescriptor),
    Many(Vec<BlinkDescriptor>),
}

impl Blinks {
    pub fn into_vec(self) -> Vec<BlinkDescriptor> {
        match self {
            Self::One(blink) => vec![blink],
            Self::Many(blinks) => blinks,
        }
    }
}

impl From<BlinkDescriptor> for Blinks {
    fn from(blink: BlinkDescriptor) -> Self {
        Self::One(blink)
    }
}

impl From<Vec<BlinkDescriptor>> for Blinks {
    fn from(blinks: Vec<BlinkDescriptor>) -> Self {
        Self::Many(blinks)
    }
}
