use futures::future::BoxFuture;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::trace;

use crate::error::{Error, Result};

/// Maximum number of requests waiting for dispatch before submitters wait.
pub const QUEUE_CAPACITY: usize = 256;

type Job = BoxFuture<'static, ()>;

/// Single-consumer FIFO that runs one unit of work at a time.
///
/// After a unit completes, the next one does not start until `delay` has
/// elapsed, however many submitters are waiting. Each submitter gets the
/// result of its own unit. There is no timeout: a unit that never completes
/// stalls every unit queued behind it.
pub struct DispatchQueue {
    sender: mpsc::Sender<Job>,
    // Taken by the first submit, which starts the drain task
    receiver: Mutex<Option<mpsc::Receiver<Job>>>,
    delay: Duration,
}

impl DispatchQueue {
    pub fn new(delay: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
            delay,
        }
    }

    /// Enqueue `work` and wait for its result.
    pub async fn submit<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.enqueue(work).await?.result().await
    }

    /// Place `work` at the back of the queue without waiting for it to run.
    ///
    /// Units run in the order their `enqueue` calls completed.
    pub async fn enqueue<T, F>(&self, work: F) -> Result<Pending<T>>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.ensure_draining();

        let (tx, rx) = oneshot::channel();
        let job: Job = Box::pin(async move {
            // The submitter may have gone away; nothing to report to then
            let _ = tx.send(work.await);
        });

        self.sender
            .send(job)
            .await
            .map_err(|_| Error::unknown("dispatch queue has stopped"))?;

        Ok(Pending { reply: rx })
    }

    fn ensure_draining(&self) {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(receiver) = receiver {
            tokio::spawn(drain(receiver, self.delay));
        }
    }
}

/// A queued unit's eventual result.
pub struct Pending<T> {
    reply: oneshot::Receiver<Result<T>>,
}

impl<T> Pending<T> {
    pub async fn result(self) -> Result<T> {
        self.reply
            .await
            .map_err(|_| Error::unknown("dispatch queue dropped the request"))?
    }
}

async fn drain(mut receiver: mpsc::Receiver<Job>, delay: Duration) {
    let mut last_completed: Option<Instant> = None;

    while let Some(job) = receiver.recv().await {
        if let Some(completed) = last_completed {
            tokio::time::sleep_until(completed + delay).await;
        }

        trace!("Dispatching queued request");
        job.await;
        last_completed = Some(Instant::now());
    }

    trace!("Dispatch queue closed");
}
