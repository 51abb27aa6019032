use crate::context::Context;
use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use crate::metadata::{Counters, MetadataKey};
use crate::queue::PathQueue;
use exn::{OptionExt, ResultExt};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::instrument;
use zimpack_classify::Namespace;
use zimpack_rewrite::{Document, url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Metadata, then redirects from the redirects file.
    Leading,
    Files,
    /// Files are exhausted and the counts are final.
    Counter,
    Done,
}

/// What a run produced, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Entries handed out, redirects included.
    pub entries: usize,
    pub redirects: usize,
    /// Entries that were never handed out: dangling redirects and
    /// duplicates.
    pub dropped: usize,
}

/// Produces the ordered entries of an archive and their payloads.
///
/// Entries come in four strictly sequential phases:
///
/// 1. the metadata entries (everything but `Counter`),
/// 2. redirects from the optional redirects file,
/// 3. one entry per discovered file, skipping invalid ones,
/// 4. the `Counter` metadata entry, once the file counts are final.
pub struct EntrySource {
    context: Context,
    queue: PathQueue,
    phase: Phase,
    leading: VecDeque<Entry>,
    seen: HashSet<String>,
    stats: Stats,
}
impl EntrySource {
    /// `redirects` are entries read from a redirects file; those pointing at
    /// a file missing from the source tree are dropped here.
    pub fn new(context: Context, queue: PathQueue, redirects: Vec<Entry>) -> Self {
        let mut stats = Stats::default();
        let mut leading: VecDeque<Entry> = MetadataKey::LEADING.into_iter().map(|key| context.metadata.entry(key)).collect();
        for redirect in redirects {
            let exists = redirect.redirect.as_deref().is_some_and(|target| context.root().join(target).is_file());
            if exists {
                leading.push_back(redirect);
            } else {
                tracing::debug!(entry = %redirect, "Dropping redirect to a missing file");
                stats.dropped += 1;
            }
        }
        Self {
            context,
            queue,
            phase: Phase::Leading,
            leading,
            seen: HashSet::new(),
            stats,
        }
    }

    /// Id of the main page.
    pub fn main_page(&self) -> &str {
        self.context.welcome()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn counters(&self) -> &Counters {
        self.context.counters()
    }

    /// The next entry, or [`None`] once every entry has been produced.
    ///
    /// Blocks while waiting for the walker to discover more files, so must
    /// not be called from inside an async context. Traversal and read
    /// failures are fatal.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        loop {
            match self.phase {
                Phase::Leading => match self.leading.pop_front() {
                    Some(entry) => {
                        if let Some(entry) = self.accept(entry) {
                            return Ok(Some(entry));
                        }
                    },
                    None => self.phase = Phase::Files,
                },
                Phase::Files => match self.queue.pop()? {
                    Some(path) => {
                        let Some(entry) = self.file_entry(&path)? else {
                            self.stats.dropped += 1;
                            continue;
                        };
                        if let Some(entry) = self.accept(entry) {
                            if !entry.is_redirect() {
                                self.context.counters.record(&entry.mime_type);
                            }
                            return Ok(Some(entry));
                        }
                    },
                    None => {
                        tracing::info!(files = self.context.counters.total(), "All files packaged");
                        self.phase = Phase::Counter;
                    },
                },
                Phase::Counter => {
                    self.phase = Phase::Done;
                    let entry = self.context.metadata.entry(MetadataKey::Counter);
                    if let Some(entry) = self.accept(entry) {
                        return Ok(Some(entry));
                    }
                },
                Phase::Done => return Ok(None),
            }
        }
    }

    /// Payload of a previously produced, non-redirect entry. File payloads
    /// are read fresh from disk and rewritten if they are HTML or CSS.
    #[instrument(level = "trace", skip(self))]
    pub fn payload(&mut self, id: &str) -> Result<Vec<u8>> {
        if id.starts_with('/') {
            let key = MetadataKey::from_id(id).ok_or_raise(|| ErrorKind::UnknownEntry(id.to_string()))?;
            let payload = self
                .context
                .metadata
                .payload(key, &self.context.counters)
                .ok_or_raise(|| ErrorKind::UnknownEntry(id.to_string()))?;
            return Ok(payload.into_bytes());
        }
        let path = self.context.root().join(id);
        let bytes = std::fs::read(&path).or_raise(|| ErrorKind::Read(path.clone()))?;
        let mime_type = self.context.classifier.mime_type_for(id);
        Ok(self.context.rewriter.rewrite(&mut self.context.classifier, id, &mime_type, bytes))
    }

    /// Rejects entries whose `namespace/url` was already handed out, and
    /// keeps the stats current.
    fn accept(&mut self, entry: Entry) -> Option<Entry> {
        if !self.seen.insert(entry.path()) {
            tracing::warn!(entry = %entry, "Dropping duplicate entry");
            self.stats.dropped += 1;
            return None;
        }
        self.stats.entries += 1;
        if entry.is_redirect() {
            self.stats.redirects += 1;
        }
        Some(entry)
    }

    /// Builds the entry for a discovered file; [`None`] if the file is an
    /// HTML redirect to a file that does not exist.
    #[instrument(level = "trace", skip(self))]
    fn file_entry(&mut self, path: &Path) -> Result<Option<Entry>> {
        let id = self.context.id_for(path);
        let mime_type = self.context.classifier.mime_type_for(&id);
        let namespace = Namespace::for_mime_type(&mime_type);
        if mime_type != "text/html" {
            return Ok(Some(Entry::file(id, namespace, "", mime_type)));
        }

        let html = std::fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
        let document = Document::parse(&html);
        let title = document.title().unwrap_or_else(|| url::title_from_filename(&id));
        let Some(target) = document.refresh_target() else {
            return Ok(Some(Entry::file(id, namespace, title, mime_type)));
        };
        if !url::is_local(&target) {
            tracing::debug!(id = %id, redirect = %target, "Keeping page that refreshes to an external URL");
            return Ok(Some(Entry::file(id, namespace, title, mime_type)));
        }
        match url::resolve_id(&id, &target) {
            Some(resolved) if resolved != id && self.context.root().join(&resolved).is_file() => {
                tracing::debug!(id = %id, redirect = %resolved, "Detected redirect");
                Ok(Some(Entry::file(id, namespace, title, mime_type).redirecting_to(resolved)))
            },
            _ => {
                tracing::debug!(id = %id, redirect = %target, "Dropping redirect to a missing file");
                Ok(None)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::path_queue;
    use std::fs;
    use std::path::PathBuf;
    use zimpack_config::Config;

    fn config(root: &Path) -> Config {
        Config {
            source: root.to_path_buf(),
            language: "eng".to_string(),
            publisher: "Publisher".to_string(),
            creator: "Creator".to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            welcome: "index.html".to_string(),
            favicon: "favicon.png".to_string(),
            ..Config::default()
        }
    }

    /// An entry source fed with `files` (relative to `root`) in order.
    fn source(root: &Path, files: &[&str], redirects: Vec<Entry>) -> EntrySource {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (tx, queue) = path_queue(files.len().max(1));
        runtime.block_on(async {
            for file in files {
                assert!(tx.push(root.join(file)).await);
            }
        });
        drop(tx);
        EntrySource::new(Context::new(&config(root)), queue, redirects)
    }

    fn drain(source: &mut EntrySource) -> Vec<Entry> {
        std::iter::from_fn(|| source.next_entry().unwrap()).collect()
    }

    fn write(root: &Path, file: &str, contents: &str) {
        let path = root.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_phases_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<html><head><title>Home</title></head></html>");
        let mut source = source(dir.path(), &["index.html"], vec![]);
        let ids: Vec<String> = drain(&mut source).into_iter().map(|entry| entry.id).collect();
        assert_eq!(
            ids,
            [
                "/M/Language",
                "/M/Publisher",
                "/M/Creator",
                "/M/Title",
                "/M/Description",
                "/M/Date",
                "/M/Favicon",
                "index.html",
                "/M/Counter"
            ]
        );
        assert_eq!(source.next_entry().unwrap(), None);
        assert_eq!(source.main_page(), "index.html");
    }

    #[test]
    fn test_titles() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Main_Page.html", "<html><head></head><body>No title</body></html>");
        write(dir.path(), "titled.html", "<html><head><title>Titled</title></head></html>");
        write(dir.path(), "notes.txt", "plain");
        let mut source = source(dir.path(), &["Main_Page.html", "titled.html", "notes.txt"], vec![]);
        let titles: Vec<(String, String)> = drain(&mut source)
            .into_iter()
            .filter(|entry| !entry.id.starts_with('/'))
            .map(|entry| (entry.id, entry.title))
            .collect();
        assert_eq!(
            titles,
            [
                ("Main_Page.html".to_string(), "Main Page".to_string()),
                ("titled.html".to_string(), "Titled".to_string()),
                ("notes.txt".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_redirect_detection() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "target.html", "<html><head><title>T</title></head></html>");
        write(dir.path(), "old/page.html", r#"<html><head><meta http-equiv="refresh" content="0;url=../target.html"></head></html>"#);
        write(dir.path(), "gone.html", r#"<html><head><meta http-equiv="refresh" content="0;url=missing.html"></head></html>"#);
        let mut source = source(dir.path(), &["target.html", "old/page.html", "gone.html"], vec![]);
        let files: Vec<Entry> = drain(&mut source).into_iter().filter(|entry| !entry.id.starts_with('/')).collect();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].id, "old/page.html");
        assert_eq!(files[1].redirect.as_deref(), Some("target.html"));
        assert_eq!(source.counters().render(), "text/html=1;");
        assert_eq!(source.stats().dropped, 1);
    }

    #[test]
    fn test_redirects_file_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<html></html>");
        let redirect = |url: &str, target: &str| Entry {
            id: format!("/A/{url}"),
            namespace: Namespace::Content,
            url: url.to_string(),
            title: String::new(),
            mime_type: String::new(),
            redirect: Some(target.to_string()),
        };
        let redirects = vec![redirect("Home", "index.html"), redirect("Nowhere", "nowhere.html")];
        let mut source = source(dir.path(), &["index.html"], redirects);
        let entries = drain(&mut source);
        let paths: Vec<String> = entries.iter().skip(7).map(Entry::path).collect();
        assert_eq!(paths, ["A/Home", "A/index.html", "M/Counter"]);
        assert_eq!(
            source.stats(),
            Stats {
                entries: 10,
                redirects: 2,
                dropped: 1
            }
        );
    }

    #[test]
    fn test_duplicate_paths_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", "<html></html>");
        let mut source = source(dir.path(), &["index.html", "index.html"], vec![]);
        let files = drain(&mut source).into_iter().filter(|entry| entry.id == "index.html").count();
        assert_eq!(files, 1);
        assert_eq!(source.counters().get("text/html"), 1);
    }

    #[test]
    fn test_payloads() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.html", r#"<html><head><link href="style.css" rel="stylesheet"></head></html>"#);
        write(dir.path(), "style.css", "body{}");
        let mut source = source(dir.path(), &["index.html", "style.css"], vec![]);
        drain(&mut source);
        let html = String::from_utf8(source.payload("index.html").unwrap()).unwrap();
        assert!(html.contains(r#"href="../-/style.css""#), "{html}");
        assert_eq!(source.payload("/M/Language").unwrap(), b"eng");
        assert_eq!(source.payload("/M/Counter").unwrap(), b"text/html=1;text/css=1;");
        assert_eq!(*source.payload("/M/Favicon").unwrap_err(), ErrorKind::UnknownEntry("/M/Favicon".to_string()));
        assert_eq!(*source.payload("/A/Home").unwrap_err(), ErrorKind::UnknownEntry("/A/Home".to_string()));
    }

    #[test]
    fn test_vanished_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = source(dir.path(), &["vanished.html"], vec![]);
        for _ in MetadataKey::LEADING {
            source.next_entry().unwrap();
        }
        let err = source.next_entry().unwrap_err();
        assert_eq!(*err, ErrorKind::Read(PathBuf::from(dir.path().join("vanished.html"))));
    }
}
