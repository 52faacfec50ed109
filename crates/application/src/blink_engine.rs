use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

use domain::attribute::names;
use domain::{BlinkDescriptor, Result};

use crate::queue::{Completion, Generation, Pending, SerialQueue, Ticket, Worker, noop, settle};
use crate::write_queue::WriteQueue;

/// Drives one blink cycle at a time: on for `timing.on`, off for `timing.off`.
///
/// Each phase is timed from the moment its write completed, so a busy write
/// queue delays a phase but never shortens it.
struct Blinker {
    device_id: String,
    writes: Arc<WriteQueue>,
    max: i64,
    default_rate: f64,
}

impl Blinker {
    /// Write `level`, then keep it for `hold`
    async fn phase(&self, ticket: &Ticket<BlinkDescriptor>, level: i64, hold: Duration) -> Result<()> {
        let pending = ticket.while_live(|| self.writes.submit(names::BRIGHTNESS, level))?;
        pending.await?;

        match Instant::now().checked_add(hold) {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
        Ok(())
    }
}

#[async_trait]
impl Worker<BlinkDescriptor> for Blinker {
    async fn run(&mut self, blink: BlinkDescriptor, ticket: &Ticket<BlinkDescriptor>) -> Result<()> {
        let timing = blink.timing(self.default_rate);
        debug!(device_id = %self.device_id, on = ?timing.on, off = ?timing.off, "Blink");

        // A cycle without on-time does not light the LED
        if !timing.on.is_zero() {
            self.phase(ticket, self.max, timing.on).await?;
        }
        self.phase(ticket, 0, timing.off).await
    }
}

/// Serialises the blink cycles of one LED, writing through its [`WriteQueue`]
pub struct BlinkEngine {
    queue: SerialQueue<BlinkDescriptor>,
}

impl BlinkEngine {
    pub fn new(device_id: &str, writes: Arc<WriteQueue>, max: i64, default_rate: f64) -> Self {
        let blinker = Blinker {
            device_id: device_id.to_string(),
            writes,
            max,
            default_rate,
        };
        Self {
            queue: SerialQueue::spawn("blinker", blinker),
        }
    }

    pub fn enqueue(&self, blink: BlinkDescriptor, done: impl FnOnce(Result<()>) + Send + 'static) {
        self.queue.push(blink, Box::new(done));
    }

    pub fn submit(&self, blink: BlinkDescriptor) -> Pending {
        let (done, pending) = Pending::channel();
        self.enqueue(blink, done);
        pending
    }

    /// Queue a whole sequence; `done` fires after the last cycle.
    ///
    /// Nothing is queued if the engine was killed since `generation` was
    /// taken; `done` is then dropped without firing. An empty sequence is
    /// not queued either and `done` receives `Ok` from a separate task.
    pub fn enqueue_sequence(
        &self,
        generation: &Generation,
        blinks: Vec<BlinkDescriptor>,
        done: Completion,
    ) -> bool {
        if blinks.is_empty() {
            if !generation.is_current() {
                return false;
            }
            settle(done, Ok(()));
            return true;
        }

        let mut jobs: Vec<(BlinkDescriptor, Completion)> =
            blinks.into_iter().map(|blink| (blink, noop())).collect();
        if let Some(last) = jobs.last_mut() {
            last.1 = done;
        }

        self.queue.push_all(generation, jobs)
    }

    pub fn generation(&self) -> Generation {
        self.queue.generation()
    }

    /// Drop every cycle not yet started. The running cycle finishes its
    /// current phase, schedules nothing further and never completes.
    pub fn kill(&self) -> usize {
        self.queue.kill()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
