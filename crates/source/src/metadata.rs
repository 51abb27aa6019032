use crate::entry::Entry;
use indexmap::IndexMap;
use std::fmt;
use time::{Date, OffsetDateTime};
use zimpack_classify::Namespace;
use zimpack_config::Config;

/// Archive-level entries in the `M` namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    Language,
    Publisher,
    Creator,
    Title,
    Description,
    Date,
    /// Redirect to the configured favicon file, in the `-` namespace.
    Favicon,
    /// `mime=count;` per MIME type of emitted non-redirect entries.
    Counter,
}
impl MetadataKey {
    /// Keys emitted ahead of the file entries, in order. [`Counter`](Self::Counter)
    /// is left out: it is only meaningful once every file has been seen.
    pub const LEADING: [Self; 7] = [
        Self::Language,
        Self::Publisher,
        Self::Creator,
        Self::Title,
        Self::Description,
        Self::Date,
        Self::Favicon,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Language => "Language",
            Self::Publisher => "Publisher",
            Self::Creator => "Creator",
            Self::Title => "Title",
            Self::Description => "Description",
            Self::Date => "Date",
            Self::Favicon => "Favicon",
            Self::Counter => "Counter",
        }
    }

    /// Entry id. File ids never start with `/`, so these cannot collide.
    pub fn id(self) -> String {
        format!("/M/{}", self.name())
    }

    /// Inverse of [`id`](Self::id).
    pub fn from_id(id: &str) -> Option<Self> {
        let name = id.strip_prefix("/M/")?;
        Self::LEADING.into_iter().chain([Self::Counter]).find(|key| key.name() == name)
    }
}
impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running count of emitted non-redirect entries per MIME type, in order of
/// first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counters {
    counts: IndexMap<String, usize>,
}
impl Counters {
    pub fn record(&mut self, mime_type: &str) {
        match self.counts.get_mut(mime_type) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(mime_type.to_string(), 1);
            },
        }
    }

    pub fn get(&self, mime_type: &str) -> usize {
        self.counts.get(mime_type).copied().unwrap_or(0)
    }

    /// Total over every MIME type.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(mime_type, count)| (mime_type.as_str(), *count))
    }

    /// `mime1=count1;mime2=count2;...`, every pair terminated by `;`.
    ///
    /// ```
    /// use zimpack_source::Counters;
    /// let mut counters = Counters::default();
    /// counters.record("text/html");
    /// counters.record("image/png");
    /// counters.record("text/html");
    /// assert_eq!(counters.render(), "text/html=2;image/png=1;");
    /// ```
    pub fn render(&self) -> String {
        self.iter().map(|(mime_type, count)| format!("{mime_type}={count};")).collect()
    }
}

/// Builds the metadata entries and their payloads from the run's
/// configuration.
#[derive(Debug, Clone)]
pub struct MetadataSynthesizer {
    language: String,
    publisher: String,
    creator: String,
    title: String,
    description: String,
    favicon: String,
}
impl MetadataSynthesizer {
    pub fn new(config: &Config) -> Self {
        Self {
            language: config.language.clone(),
            publisher: config.publisher.clone(),
            creator: config.creator.clone(),
            title: config.title.clone(),
            description: config.description.clone(),
            favicon: config.favicon.clone(),
        }
    }

    pub fn entry(&self, key: MetadataKey) -> Entry {
        match key {
            MetadataKey::Favicon => Entry {
                id: key.id(),
                namespace: Namespace::Auxiliary,
                url: "favicon".to_string(),
                title: String::new(),
                mime_type: String::new(),
                redirect: Some(self.favicon.clone()),
            },
            _ => Entry {
                id: key.id(),
                namespace: Namespace::Metadata,
                url: key.name().to_string(),
                title: key.name().to_string(),
                mime_type: "text/plain".to_string(),
                redirect: None,
            },
        }
    }

    /// Payload of a metadata entry; [`None`] for the favicon redirect.
    ///
    /// `Date` is computed when requested; `Counter` renders `counters` as
    /// they stand.
    pub fn payload(&self, key: MetadataKey, counters: &Counters) -> Option<String> {
        Some(match key {
            MetadataKey::Language => self.language.clone(),
            MetadataKey::Publisher => self.publisher.clone(),
            MetadataKey::Creator => self.creator.clone(),
            MetadataKey::Title => self.title.clone(),
            MetadataKey::Description => self.description.clone(),
            MetadataKey::Date => format_date(OffsetDateTime::now_utc().date()),
            MetadataKey::Favicon => return None,
            MetadataKey::Counter => counters.render(),
        })
    }
}

/// `YYYY-MM-DD`, zero-padded.
pub(crate) fn format_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}
