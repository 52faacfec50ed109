use async_trait::async_trait;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use domain::{AttributeStore, Result};

use crate::queue::{Completion, Pending, SerialQueue, Ticket, Worker};

/// One attribute write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteJob {
    pub attribute: String,
    pub value: String,
}

struct AttributeWriter {
    device_id: String,
    location: PathBuf,
    store: Arc<dyn AttributeStore>,
}

#[async_trait]
impl Worker<WriteJob> for AttributeWriter {
    async fn run(&mut self, job: WriteJob, _ticket: &Ticket<WriteJob>) -> Result<()> {
        debug!(device_id = %self.device_id, attribute = %job.attribute, value = %job.value, "Writing attribute");

        let result = self
            .store
            .write(&self.location, &job.attribute, &job.value)
            .await;
        if let Err(e) = &result {
            warn!(device_id = %self.device_id, attribute = %job.attribute, error = %e, "Attribute write failed");
        }
        result
    }
}

/// Serialises the attribute writes of one LED.
///
/// At most one write is in flight; completions fire in submission order and
/// a failed write does not affect the ones queued after it.
pub struct WriteQueue {
    queue: SerialQueue<WriteJob>,
}

impl WriteQueue {
    pub fn new(device_id: &str, location: PathBuf, store: Arc<dyn AttributeStore>) -> Self {
        let writer = AttributeWriter {
            device_id: device_id.to_string(),
            location,
            store,
        };
        Self {
            queue: SerialQueue::spawn("writer", writer),
        }
    }

    pub fn enqueue(
        &self,
        attribute: &str,
        value: impl Display,
        done: impl FnOnce(Result<()>) + Send + 'static,
    ) {
        let job = WriteJob {
            attribute: attribute.to_string(),
            value: value.to_string(),
        };
        self.queue.push(job, Box::new(done) as Completion);
    }

    pub fn submit(&self, attribute: &str, value: impl Display) -> Pending {
        let (done, pending) = Pending::channel();
        self.enqueue(attribute, value, done);
        pending
    }

    /// Drop every write not yet started; their completions never fire
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
