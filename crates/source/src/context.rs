use crate::metadata::{Counters, MetadataSynthesizer};
use std::path::{Path, PathBuf};
use zimpack_classify::Classifier;
use zimpack_config::Config;
use zimpack_rewrite::Rewriter;

/// Everything a run shares between its stages, built once at start-up.
///
/// The caches (MIME types in the classifier, URLs in the rewriter) and the
/// counters only ever change on the consumer side.
pub struct Context {
    root: PathBuf,
    welcome: String,
    pub(crate) classifier: Classifier,
    pub(crate) rewriter: Rewriter,
    pub(crate) counters: Counters,
    pub(crate) metadata: MetadataSynthesizer,
}
impl Context {
    pub fn new(config: &Config) -> Self {
        Self::with_classifier(config, Classifier::with_magic(&config.source))
    }

    /// A context classifying files with a custom [`Classifier`], e.g. one
    /// backed by another [`Sniffer`](zimpack_classify::Sniffer).
    pub fn with_classifier(config: &Config, classifier: Classifier) -> Self {
        Self {
            root: config.source.clone(),
            welcome: config.welcome.clone(),
            classifier,
            rewriter: Rewriter::new(),
            counters: Counters::default(),
            metadata: MetadataSynthesizer::new(config),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Id of the main page.
    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Entry id of a discovered path: relative to the root, `/`-separated.
    pub fn id_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
