//! File classification for archive entries.
//!
//! A file's MIME type is resolved, in order, from:
//!
//! 1. the extension override table ([`mime_type_for_extension`]),
//! 2. the per-run MIME cache,
//! 3. an injected [`Sniffer`] reading the file from disk (parameters such as
//!    `charset` are stripped and the result cached).
//!
//! The MIME type then decides the entry's [`Namespace`].

pub mod error;
mod mime;
mod namespace;
mod sniff;

pub use crate::mime::{EMBEDDABLE_FONTS, is_embeddable_font, mime_type_for_extension, strip_parameters};
pub use crate::namespace::Namespace;
pub use crate::sniff::{MagicSniffer, SNIFF_BYTES, Sniffer};
use crate::error::ErrorKind;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Resolves MIME types (and from them, namespaces) for paths relative to a
/// source tree root.
pub struct Classifier {
    root: PathBuf,
    sniffer: Box<dyn Sniffer>,
    cache: HashMap<String, String>,
}
impl Classifier {
    pub fn new(root: impl Into<PathBuf>, sniffer: impl Sniffer + 'static) -> Self {
        Self {
            root: root.into(),
            sniffer: Box::new(sniffer),
            cache: HashMap::new(),
        }
    }

    /// A classifier backed by the built-in [`MagicSniffer`].
    pub fn with_magic(root: impl Into<PathBuf>) -> Self {
        Self::new(root, MagicSniffer)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the MIME type for a path relative to the root, or an empty
    /// string when nothing can identify it.
    ///
    /// Sniffing failures are not fatal: a file that cannot be read (a link to
    /// something that was never there, most likely) simply has no MIME type.
    #[instrument(level = "trace", skip(self))]
    pub fn mime_type_for(&mut self, relative: &str) -> String {
        if let Some(mime_type) = mime::extension_of(relative).and_then(mime_type_for_extension) {
            return mime_type.to_string();
        }
        if let Some(cached) = self.cache.get(relative) {
            return cached.clone();
        }
        let path = self.root.join(relative);
        let mime_type = match self.sniffer.sniff(&path) {
            Ok(Some(sniffed)) => strip_parameters(&sniffed).to_string(),
            Ok(None) => String::new(),
            Err(err) => {
                match &*err {
                    ErrorKind::NotFound(_) => tracing::debug!(path = %path.display(), "Cannot sniff missing file"),
                    other => tracing::warn!(path = %path.display(), error = %other, "Unable to sniff file"),
                }
                String::new()
            },
        };
        // Unidentified paths are cached too, as the empty type.
        self.cache.insert(relative.to_string(), mime_type.clone());
        mime_type
    }

    /// Shorthand for [`Namespace::for_mime_type`] of [`mime_type_for`](Self::mime_type_for).
    pub fn namespace_for(&mut self, relative: &str) -> Namespace {
        Namespace::for_mime_type(&self.mime_type_for(relative))
    }
}
