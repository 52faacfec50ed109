use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use domain::attribute::names;
use domain::led::parse_brightness;
use domain::{
    AttributeStore, BlinkDescriptor, BrightnessBounds, DomainError, EncodeResult, Encoding,
    Result, TriggerInfo,
};

use crate::blink_engine::BlinkEngine;
use crate::encoders::EncoderRegistry;
use crate::queue::{Completion, Generation, Pending, settle};
use crate::write_queue::WriteQueue;

struct Inner {
    id: String,
    location: PathBuf,
    bounds: BrightnessBounds,
    store: Arc<dyn AttributeStore>,
    writes: Arc<WriteQueue>,
    blinks: BlinkEngine,
    encoders: Arc<EncoderRegistry>,
}

impl Inner {
    fn enqueue_encoded(
        &self,
        name: &str,
        result: EncodeResult,
        generation: &Generation,
        done: Completion,
    ) {
        match result {
            Ok(blinks) => {
                let blinks = blinks.into_vec();
                debug!(device_id = %self.id, encoder = %name, count = blinks.len(), "Queueing encoded blinks");
                if !self.blinks.enqueue_sequence(generation, blinks, done) {
                    debug!(device_id = %self.id, encoder = %name, "Dropped blinks encoded before a reset");
                }
            }
            Err(e) => {
                warn!(device_id = %self.id, encoder = %name, error = %e, "Encoder failed");
                settle(
                    done,
                    Err(DomainError::Handler {
                        name: name.to_string(),
                        message: e.to_string(),
                    }),
                );
            }
        }
    }
}

/// Handle on one LED.
///
/// Every state change goes through one of two ordered queues owned by the
/// handle: writes (brightness, trigger) and blinks. Each operation comes in
/// two shapes:
///
/// - `op(..)` queues the operation and returns a [`Pending`] to await;
/// - `op_then(.., done)` queues the operation, calls `done` with its outcome
///   and returns the handle for chaining.
///
/// Queueing happens when the method is called, so operations keep call order
/// no matter when, or whether, the `Pending` values are awaited. Errors are
/// always delivered through the `Pending` or `done`, never returned directly.
///
/// Cloning is cheap and clones share the queues. Dropping the last clone
/// discards everything still queued.
#[derive(Clone)]
pub struct LedDevice {
    inner: Arc<Inner>,
}

impl LedDevice {
    /// Must be called within a Tokio runtime: the queues spawn their tasks here.
    pub(crate) fn new(
        id: &str,
        location: PathBuf,
        bounds: BrightnessBounds,
        store: Arc<dyn AttributeStore>,
        encoders: Arc<EncoderRegistry>,
        default_rate: f64,
    ) -> Self {
        let writes = Arc::new(WriteQueue::new(id, location.clone(), store.clone()));
        let blinks = BlinkEngine::new(id, writes.clone(), bounds.max, default_rate);
        info!(device_id = %id, location = %location.display(), max = bounds.max, "LED ready");

        Self {
            inner: Arc::new(Inner {
                id: id.to_string(),
                location,
                bounds,
                store,
                writes,
                blinks,
                encoders,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn location(&self) -> &Path {
        &self.inner.location
    }

    pub fn bounds(&self) -> BrightnessBounds {
        self.inner.bounds
    }

    /// Current brightness, read from the device (blocking)
    pub fn current_value(&self) -> Result<i64> {
        let raw = self.inner.store.read(&self.inner.location, names::BRIGHTNESS)?;
        parse_brightness(&raw, &self.inner.location)
    }

    /// Supported and active triggers, read from the device (blocking)
    pub fn triggers(&self) -> Result<TriggerInfo> {
        TriggerInfo::load(self.inner.store.as_ref(), &self.inner.location)
    }

    /// Names of the encoders callable through [`LedDevice::encode`]
    pub fn encoders(&self) -> Vec<String> {
        self.inner.encoders.names()
    }

    /// Number of writes and blinks waiting to start
    pub fn queued(&self) -> (usize, usize) {
        (self.inner.writes.len(), self.inner.blinks.len())
    }

    // --- brightness ---

    /// Set the brightness, clamped into the LED's bounds
    pub fn set_brightness_then(
        &self,
        value: i64,
        done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> &Self {
        let level = self.inner.bounds.clamp(value);
        self.inner.writes.enqueue(names::BRIGHTNESS, level, done);
        self
    }

    pub fn set_brightness(&self, value: i64) -> Pending {
        let (done, pending) = Pending::channel();
        self.set_brightness_then(value, done);
        pending
    }

    pub fn turn_on_then(&self, done: impl FnOnce(Result<()>) + Send + 'static) -> &Self {
        self.set_brightness_then(self.inner.bounds.max, done)
    }

    pub fn turn_on(&self) -> Pending {
        self.set_brightness(self.inner.bounds.max)
    }

    pub fn turn_off_then(&self, done: impl FnOnce(Result<()>) + Send + 'static) -> &Self {
        self.set_brightness_then(self.inner.bounds.min, done)
    }

    pub fn turn_off(&self) -> Pending {
        self.set_brightness(self.inner.bounds.min)
    }

    // --- trigger ---

    /// Select a trigger.
    ///
    /// The trigger list is read from the device on every call; a trigger it
    /// does not list fails with [`DomainError::Validation`] and nothing is
    /// written.
    pub fn set_trigger_then(
        &self,
        trigger: &str,
        done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> &Self {
        match self.triggers() {
            Ok(info) if info.supports(trigger) => {
                self.inner.writes.enqueue(names::TRIGGER, trigger, done);
            }
            Ok(_) => {
                warn!(device_id = %self.inner.id, trigger = %trigger, "Unsupported trigger");
                let err = DomainError::Validation(format!(
                    "Unsupported trigger: '{}' for LED {}",
                    trigger, self.inner.id
                ));
                settle(Box::new(done), Err(err));
            }
            Err(e) => settle(Box::new(done), Err(e)),
        }
        self
    }

    pub fn set_trigger(&self, trigger: &str) -> Pending {
        let (done, pending) = Pending::channel();
        self.set_trigger_then(trigger, done);
        pending
    }

    // --- blinking ---

    pub fn blink_then(
        &self,
        blink: BlinkDescriptor,
        done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> &Self {
        self.inner.blinks.enqueue(blink, done);
        self
    }

    pub fn blink(&self, blink: BlinkDescriptor) -> Pending {
        self.inner.blinks.submit(blink)
    }

    /// Run the encoder registered as `name` on `input` and queue the blinks it
    /// produces. `done` fires once, after the last of them.
    pub fn encode_then(
        &self,
        name: &str,
        input: &str,
        done: impl FnOnce(Result<()>) + Send + 'static,
    ) -> &Self {
        let done: Completion = Box::new(done);
        let Some(encoder) = self.inner.encoders.get(name) else {
            settle(
                done,
                Err(DomainError::Configuration(format!("No encoder named '{}'", name))),
            );
            return self;
        };

        let generation = self.inner.blinks.generation();
        match encoder.encode(input) {
            Encoding::Ready(result) => {
                self.inner.enqueue_encoded(name, result, &generation, done);
            }
            Encoding::Deferred(encoding) => {
                let inner = self.inner.clone();
                let name = name.to_string();
                tokio::spawn(async move {
                    let result = encoding.await;
                    inner.enqueue_encoded(&name, result, &generation, done);
                });
            }
        }
        self
    }

    pub fn encode(&self, name: &str, input: &str) -> Pending {
        let (done, pending) = Pending::channel();
        self.encode_then(name, input, done);
        pending
    }

    /// Blink `text` in morse code
    pub fn morse(&self, text: &str) -> Pending {
        self.encode("morse", text)
    }

    // --- reset ---

    /// Discard every queued write and blink, then turn the LED off.
    ///
    /// Nothing queued before the reset reports back afterwards; `done` only
    /// hears about the final turn-off.
    pub fn reset_then(&self, done: impl FnOnce(Result<()>) + Send + 'static) -> &Self {
        let blinks = self.inner.blinks.kill();
        let writes = self.inner.writes.kill();
        debug!(device_id = %self.inner.id, blinks, writes, "Reset");
        self.turn_off_then(done)
    }

    pub fn reset(&self) -> Pending {
        let (done, pending) = Pending::channel();
        self.reset_then(done);
        pending
    }
}

impl fmt::Display for LedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedDevice({})", self.inner.id)
    }
}

impl fmt::Debug for LedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedDevice")
            .field("id", &self.inner.id)
            .field("location", &self.inner.location)
            .field("bounds", &self.inner.bounds)
            .finish()
    }
}
