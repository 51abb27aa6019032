//! The seam between entry production and archive persistence.

use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use crate::source::EntrySource;
use exn::ResultExt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;

/// What an archive writer pulls entries from.
pub trait ArchiveSource {
    /// The next entry, or [`None`] when there are no more.
    fn next_entry(&mut self) -> Result<Option<Entry>>;
    /// Payload of an entry previously returned by
    /// [`next_entry`](Self::next_entry). Never called for redirects.
    fn payload(&mut self, id: &str) -> Result<Vec<u8>>;
    /// Id of the entry to open first, if any.
    fn main_page(&self) -> Option<&str> {
        None
    }
}
impl ArchiveSource for EntrySource {
    fn next_entry(&mut self) -> Result<Option<Entry>> {
        EntrySource::next_entry(self)
    }

    fn payload(&mut self, id: &str) -> Result<Vec<u8>> {
        EntrySource::payload(self, id)
    }

    fn main_page(&self) -> Option<&str> {
        Some(EntrySource::main_page(self))
    }
}

/// Persists every entry of an [`ArchiveSource`], pulling them one at a time.
pub trait ArchiveWriter {
    fn write(&mut self, source: &mut dyn ArchiveSource) -> Result<WriteSummary>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Entries stored with a payload.
    pub payloads: usize,
    pub redirects: usize,
    /// Total payload size in bytes.
    pub bytes: u64,
}

/// File name of the redirect index written by [`DumpWriter`].
pub const REDIRECTS_FILE: &str = "redirects.tsv";
/// File name holding the main page id written by [`DumpWriter`].
pub const MAIN_PAGE_FILE: &str = "main_page";

/// Writes entries out as a plain directory tree.
///
/// Every entry with a payload becomes `<output>/<namespace>/<url>`; every
/// redirect becomes a `namespace<TAB>url<TAB>title<TAB>target` line of
/// `<output>/redirects.tsv`. The main page id, if any, is stored in
/// `<output>/main_page`.
///
/// Entries are first written to a hidden sibling of `<output>`, which only
/// replaces `<output>` once every entry has been written. A failed run leaves
/// no output behind.
pub struct DumpWriter {
    output: PathBuf,
    buffer_size: usize,
}
impl DumpWriter {
    /// `min_chunk_size` (KiB) sizes the write buffer of the redirect index.
    pub fn new(output: impl Into<PathBuf>, min_chunk_size: usize) -> Self {
        Self {
            output: output.into(),
            buffer_size: min_chunk_size.max(1) * 1024,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// `<parent>/.<name>.partial`, next to the output so the final rename
    /// stays on one file system.
    fn staging(&self) -> Result<PathBuf> {
        let Some(name) = self.output.file_name() else {
            exn::bail!(ErrorKind::Writer);
        };
        Ok(self.output.with_file_name(format!(".{}.partial", name.to_string_lossy())))
    }

    fn write_into(&self, dir: &Path, source: &mut dyn ArchiveSource) -> Result<WriteSummary> {
        let index = File::create(dir.join(REDIRECTS_FILE)).or_raise(|| ErrorKind::Writer)?;
        let mut index = BufWriter::with_capacity(self.buffer_size, index);
        let mut summary = WriteSummary::default();

        while let Some(entry) = source.next_entry()? {
            if let Some(target) = &entry.redirect {
                writeln!(index, "{}\t{}\t{}\t{target}", entry.namespace, entry.url, entry.title).or_raise(|| ErrorKind::Writer)?;
                summary.redirects += 1;
                continue;
            }
            let destination = destination(dir, &entry)?;
            let payload = source.payload(&entry.id)?;
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).or_raise(|| ErrorKind::Writer)?;
            }
            fs::write(&destination, &payload).or_raise(|| ErrorKind::Writer)?;
            tracing::trace!(entry = %entry, bytes = payload.len(), "Wrote entry");
            summary.payloads += 1;
            summary.bytes += payload.len() as u64;
        }
        index.flush().or_raise(|| ErrorKind::Writer)?;

        if let Some(main_page) = source.main_page() {
            fs::write(dir.join(MAIN_PAGE_FILE), main_page).or_raise(|| ErrorKind::Writer)?;
        }
        Ok(summary)
    }
}
impl ArchiveWriter for DumpWriter {
    #[instrument(level = "debug", skip_all, fields(output = %self.output.display()))]
    fn write(&mut self, source: &mut dyn ArchiveSource) -> Result<WriteSummary> {
        let staging = self.staging()?;
        if staging.exists() {
            tracing::debug!(path = %staging.display(), "Removing leftovers of an earlier run");
            fs::remove_dir_all(&staging).or_raise(|| ErrorKind::Writer)?;
        }
        fs::create_dir_all(&staging).or_raise(|| ErrorKind::Writer)?;

        let summary = match self.write_into(&staging, source) {
            Ok(summary) => summary,
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    tracing::warn!(path = %staging.display(), error = %cleanup, "Unable to remove partial output");
                }
                return Err(err);
            },
        };

        if self.output.exists() {
            fs::remove_dir_all(&self.output).or_raise(|| ErrorKind::Writer)?;
        }
        fs::rename(&staging, &self.output).or_raise(|| ErrorKind::Writer)?;
        Ok(summary)
    }
}

/// Destination of an entry under `dir`, refusing urls that would leave it.
fn destination(dir: &Path, entry: &Entry) -> Result<PathBuf> {
    let url = Path::new(&entry.url);
    if entry.url.is_empty() || !url.components().all(|c| matches!(c, Component::Normal(_))) {
        exn::bail!(ErrorKind::Writer);
    }
    Ok(dir.join(entry.namespace.to_string()).join(url))
}
