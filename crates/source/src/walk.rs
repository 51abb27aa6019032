use crate::error::{ErrorKind, Result};
use crate::queue::PathSender;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::vec::IntoIter;
use tokio::fs::{self, DirEntry};
use tokio::task::JoinHandle;
use tracing::instrument;

/// Recursively lists a source tree into a [`PathQueue`](crate::PathQueue).
///
/// Directories are visited depth-first in listing order, each one listed in
/// full before its entries are visited. Only regular files are queued; symlinks and special files are skipped. Failing to list any
/// directory, the root included, aborts the walk: the error is handed to the
/// consumer through the queue and the sender is dropped.
pub struct TreeWalker {
    root: PathBuf,
    queue: PathSender,
}
impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>, queue: PathSender) -> Self {
        Self { root: root.into(), queue }
    }

    /// Starts the walk as a task on `runtime`.
    pub fn spawn(self, runtime: &tokio::runtime::Handle) -> JoinHandle<Result<usize>> {
        runtime.spawn(self.run())
    }

    /// Walks the whole tree, returning the number of files queued.
    #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
    pub async fn run(self) -> Result<usize> {
        match walk(&self.root, &self.queue).await {
            Ok(count) => {
                tracing::info!(files = count, "Finished traversing source tree");
                Ok(count)
            },
            Err(err) => {
                tracing::error!(error = %*err, "Aborting traversal");
                let kind = (*err).clone();
                self.queue.fail(err).await;
                exn::bail!(kind)
            },
        }
    }
}

async fn list(path: &Path) -> Result<IntoIter<DirEntry>> {
    let traversal = || ErrorKind::Traversal(path.to_path_buf());
    let mut entries = fs::read_dir(path).await.or_raise(traversal)?;
    let mut listed = Vec::new();
    while let Some(entry) = entries.next_entry().await.or_raise(traversal)? {
        listed.push(entry);
    }
    Ok(listed.into_iter())
}

async fn walk(root: &Path, queue: &PathSender) -> Result<usize> {
    let mut count = 0;
    let mut stack = vec![list(root).await?];
    while let Some(entries) = stack.last_mut() {
        let Some(entry) = entries.next() else {
            stack.pop();
            continue;
        };
        let path = entry.path();
        // Does not follow symlinks.
        let file_type = entry.file_type().await.or_raise(|| ErrorKind::Traversal(path.clone()))?;
        if file_type.is_dir() {
            tracing::trace!(path = %path.display(), "Visiting directory");
            stack.push(list(&path).await?);
        } else if file_type.is_file() {
            if !queue.push(path).await {
                tracing::debug!("Consumer went away; stopping traversal");
                break;
            }
            count += 1;
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-regular file");
        }
    }
    Ok(count)
}
