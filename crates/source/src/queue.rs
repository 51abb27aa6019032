//! Bounded hand-off of discovered paths from the walker to the consumer.
//!
//! The walker pushes from an async task and waits whenever `capacity` paths
//! are already outstanding. The consumer pops from a plain thread, blocking
//! until a path arrives or every sender has been dropped. Dropping the last
//! sender is how the producer signals it has finished: anything it pushed
//! beforehand is still delivered first, so the consumer can never observe
//! "empty and finished" while paths are pending.

use crate::error::{Error, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Creates a connected sender/queue pair holding at most `capacity` paths.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn path_queue(capacity: usize) -> (PathSender, PathQueue) {
    let (tx, rx) = mpsc::channel(capacity);
    (PathSender { tx }, PathQueue { rx })
}

/// Producer half of a [`PathQueue`].
#[derive(Clone)]
pub struct PathSender {
    tx: mpsc::Sender<Result<PathBuf>>,
}
impl PathSender {
    /// Queues a path, waiting while the queue is full. Returns `false` once
    /// the consumer has gone away.
    pub async fn push(&self, path: PathBuf) -> bool {
        tracing::trace!(path = %path.display(), "Queueing path");
        self.tx.send(Ok(path)).await.is_ok()
    }

    /// Hands a fatal error to the consumer in place of the next path.
    pub async fn fail(&self, err: Error) {
        // Nobody left to tell if the consumer is already gone.
        let _ = self.tx.send(Err(err)).await;
    }
}

/// Consumer half: paths in the order they were pushed.
pub struct PathQueue {
    rx: mpsc::Receiver<Result<PathBuf>>,
}
impl PathQueue {
    /// Blocks until the next path is available.
    ///
    /// Returns `Ok(None)` once the producer has finished and every pushed
    /// path has been handed out, or the producer's error if traversal failed.
    /// Must not be called from inside an async context.
    pub fn pop(&mut self) -> Result<Option<PathBuf>> {
        self.rx.blocking_recv().transpose()
    }

    /// Async counterpart of [`pop`](Self::pop).
    pub async fn recv(&mut self) -> Result<Option<PathBuf>> {
        self.rx.recv().await.transpose()
    }
}
