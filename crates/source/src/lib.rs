//! Turns a source directory into the ordered entries of an archive.
//!
//! A [`TreeWalker`] lists the tree on an async task and feeds discovered
//! paths through a bounded [`PathQueue`]. An [`EntrySource`], driven by an
//! [`ArchiveWriter`] on a regular thread, pulls them one at a time, classifies
//! them, and produces their (rewritten) payloads on request.
//!
//! ```no_run
//! use zimpack_config::Config;
//! use zimpack_source::{ArchiveWriter, Context, DumpWriter, EntrySource, TreeWalker, path_queue};
//!
//! # fn example(config: Config) -> zimpack_source::error::Result<()> {
//! let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
//! let (sender, queue) = path_queue(config.queue_capacity);
//! let walker = TreeWalker::new(&config.source, sender).spawn(runtime.handle());
//! let mut source = EntrySource::new(Context::new(&config), queue, Vec::new());
//! DumpWriter::new(&config.output, config.min_chunk_size).write(&mut source)?;
//! runtime.block_on(walker).expect("walker panicked")?;
//! # Ok(())
//! # }
//! ```

mod context;
mod entry;
pub mod error;
mod metadata;
mod queue;
mod redirects;
mod source;
mod walk;
mod writer;

pub use crate::context::Context;
pub use crate::entry::Entry;
pub use crate::metadata::{Counters, MetadataKey, MetadataSynthesizer};
pub use crate::queue::{PathQueue, PathSender, path_queue};
pub use crate::redirects::{parse_redirects, read_redirects};
pub use crate::source::{EntrySource, Stats};
pub use crate::walk::TreeWalker;
pub use crate::writer::{ArchiveSource, ArchiveWriter, DumpWriter, MAIN_PAGE_FILE, REDIRECTS_FILE, WriteSummary};
