//! Single-concurrency ordered task channel shared by the write queue and the
//! blink engine.
//!
//! Jobs wait in an ordered buffer; a spawned dispatch task pulls the next one
//! only after the previous job finished and its completion was delivered.
//! `kill` clears the buffer and retires the current generation: discarded jobs
//! never complete, and a job already running sees its [`Ticket`] go stale so
//! its completion is dropped too.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{Notify, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use domain::{DomainError, Result};

/// Receives the outcome of a queued operation, at most once
pub type Completion = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// A completion that ignores the outcome
pub fn noop() -> Completion {
    Box::new(|_| {})
}

/// Deliver `result` to `done` from a fresh task, never from the caller's stack
pub(crate) fn settle(done: Completion, result: Result<()>) {
    tokio::spawn(async move { done(result) });
}

/// Awaitable outcome of a queued operation.
///
/// Resolves to [`DomainError::Cancelled`] if the operation was discarded by a
/// kill before it could complete.
#[derive(Debug)]
pub struct Pending {
    rx: oneshot::Receiver<Result<()>>,
}

impl Pending {
    pub fn channel() -> (Completion, Pending) {
        let (tx, rx) = oneshot::channel();
        let done: Completion = Box::new(move |result| {
            let _ = tx.send(result);
        });
        (done, Pending { rx })
    }
}

impl Future for Pending {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(DomainError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Marks the jobs admitted between two kills
#[derive(Debug, Clone)]
pub struct Generation(CancellationToken);

impl Generation {
    pub fn is_current(&self) -> bool {
        !self.0.is_cancelled()
    }
}

/// Executes the jobs of one queue, one at a time
#[async_trait]
pub trait Worker<J: Send + 'static>: Send + 'static {
    async fn run(&mut self, job: J, ticket: &Ticket<J>) -> Result<()>;
}

struct Slot<J> {
    job: J,
    done: Completion,
}

struct Gate<J> {
    pending: VecDeque<Slot<J>>,
    generation: CancellationToken,
    closed: bool,
}

struct Shared<J> {
    name: &'static str,
    gate: Mutex<Gate<J>>,
    notify: Notify,
}

impl<J> Shared<J> {
    fn lock(&self) -> MutexGuard<'_, Gate<J>> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle on the job being executed
pub struct Ticket<J> {
    generation: Generation,
    shared: Arc<Shared<J>>,
}

impl<J> Ticket<J> {
    pub fn is_live(&self) -> bool {
        self.generation.is_current()
    }

    /// Run `f` unless the queue was killed since this job started.
    ///
    /// The check and `f` happen under the queue lock, so a concurrent kill
    /// lands either before both or after both.
    pub fn while_live<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        let _gate = self.shared.lock();
        if !self.generation.is_current() {
            return Err(DomainError::Cancelled);
        }
        Ok(f())
    }
}

pub struct SerialQueue<J> {
    shared: Arc<Shared<J>>,
}

impl<J: Send + 'static> SerialQueue<J> {
    /// Start the dispatch task. Must be called within a Tokio runtime.
    pub fn spawn<W: Worker<J>>(name: &'static str, worker: W) -> Self {
        let shared = Arc::new(Shared {
            name,
            gate: Mutex::new(Gate {
                pending: VecDeque::new(),
                generation: CancellationToken::new(),
                closed: false,
            }),
            notify: Notify::new(),
        });

        tokio::spawn(dispatch(shared.clone(), worker));
        Self { shared }
    }

    pub fn push(&self, job: J, done: Completion) {
        self.shared.lock().pending.push_back(Slot { job, done });
        self.shared.notify.notify_one();
    }

    /// Append all `jobs` at once, unless `generation` was retired by a kill.
    /// Returns whether the jobs were admitted.
    pub fn push_all(&self, generation: &Generation, jobs: Vec<(J, Completion)>) -> bool {
        {
            let mut gate = self.shared.lock();
            if !generation.is_current() {
                return false;
            }
            gate.pending
                .extend(jobs.into_iter().map(|(job, done)| Slot { job, done }));
        }
        self.shared.notify.notify_one();
        true
    }

    pub fn generation(&self) -> Generation {
        Generation(self.shared.lock().generation.clone())
    }

    /// Drop every job not yet started, without completing it. Returns how
    /// many were dropped.
    pub fn kill(&self) -> usize {
        let discarded = {
            let mut gate = self.shared.lock();
            gate.generation.cancel();
            gate.generation = CancellationToken::new();
            std::mem::take(&mut gate.pending)
        };

        if !discarded.is_empty() {
            debug!(queue = self.shared.name, count = discarded.len(), "Discarded pending jobs");
        }
        discarded.len()
    }

    /// Jobs waiting to start
    pub fn len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<J> Drop for SerialQueue<J> {
    fn drop(&mut self) {
        let discarded = {
            let mut gate = self.shared.lock();
            gate.closed = true;
            gate.generation.cancel();
            std::mem::take(&mut gate.pending)
        };
        drop(discarded);
        self.shared.notify.notify_one();
    }
}

async fn dispatch<J, W>(shared: Arc<Shared<J>>, mut worker: W)
where
    J: Send + 'static,
    W: Worker<J>,
{
    loop {
        let next = {
            let mut gate = shared.lock();
            if gate.closed {
                break;
            }
            let generation = Generation(gate.generation.clone());
            gate.pending.pop_front().map(|slot| (slot, generation))
        };

        let Some((slot, generation)) = next else {
            shared.notify.notified().await;
            continue;
        };

        let ticket = Ticket {
            generation,
            shared: shared.clone(),
        };
        let result = worker.run(slot.job, &ticket).await;

        if ticket.is_live() {
            (slot.done)(result);
        } else {
            debug!(queue = shared.name, "Dropped completion of a killed job");
        }
    }

    debug!(queue = shared.name, "Queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Sleeps for the job's duration, then reports it
    struct Sleeper {
        log: mpsc::UnboundedSender<u64>,
    }

    #[async_trait]
    impl Worker<u64> for Sleeper {
        async fn run(&mut self, job: u64, _ticket: &Ticket<u64>) -> Result<()> {
            tokio::time::sleep(Duration::from_millis(job)).await;
            let _ = self.log.send(job);
            if job == 13 {
                return Err(DomainError::Io("unlucky".to_string()));
            }
            Ok(())
        }
    }

    fn sleeper() -> (SerialQueue<u64>, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SerialQueue::spawn("test", Sleeper { log: tx }), rx)
    }

    fn recorder(order: &Arc<Mutex<Vec<u64>>>, tag: u64) -> Completion {
        let order = order.clone();
        Box::new(move |_| order.lock().unwrap().push(tag))
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_one_at_a_time_in_order() {
        let (queue, mut log) = sleeper();
        let order = Arc::new(Mutex::new(Vec::new()));

        queue.push(300, recorder(&order, 300));
        queue.push(10, recorder(&order, 10));
        let (done, last) = Pending::channel();
        queue.push(20, done);

        last.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![300, 10]);
        assert_eq!(log.recv().await, Some(300));
        assert_eq!(log.recv().await, Some(10));
        assert_eq!(log.recv().await, Some(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_the_queue() {
        let (queue, _log) = sleeper();

        let (done, failed) = Pending::channel();
        queue.push(13, done);
        let (done, next) = Pending::channel();
        queue.push(1, done);

        assert!(matches!(failed.await, Err(DomainError::Io(_))));
        assert!(next.await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_kill_discards_pending_and_running_completions() {
        let (queue, mut log) = sleeper();
        let order = Arc::new(Mutex::new(Vec::new()));

        queue.push(100, recorder(&order, 100));
        queue.push(100, recorder(&order, 200));
        let (done, discarded) = Pending::channel();
        queue.push(100, done);

        // Let the first job start
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(queue.kill(), 2);
        assert_eq!(discarded.await, Err(DomainError::Cancelled));

        // The running job still finishes, silently
        assert_eq!(log.recv().await, Some(100));
        let (done, after) = Pending::channel();
        queue.push(1, done);
        after.await.unwrap();

        assert!(order.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_all_respects_generation() {
        let (queue, _log) = sleeper();

        let stale = queue.generation();
        queue.kill();
        assert!(!stale.is_current());
        assert!(!queue.push_all(&stale, vec![(1, noop())]));
        assert!(queue.is_empty());

        let current = queue.generation();
        let (done, last) = Pending::channel();
        assert!(queue.push_all(&current, vec![(1, noop()), (2, done)]));
        last.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_waiting_jobs() {
        let (queue, _log) = sleeper();
        queue.push(50, noop());
        let (done, waiting) = Pending::channel();
        queue.push(50, done);

        drop(queue);
        assert_eq!(waiting.await, Err(DomainError::Cancelled));
    }
}
