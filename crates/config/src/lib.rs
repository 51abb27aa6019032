//! Startup configuration for a packaging run.
//!
//! Values are layered with [`figment`], later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]),
//! 2. a configuration file (TOML, YAML or JSON, picked by extension); when no
//!    file is given explicitly, `zimpack.toml` in the platform configuration
//!    directory is used if it exists,
//! 3. environment variables prefixed with `ZIMPACK_` (`ZIMPACK_TITLE`, ...),
//! 4. explicit [`Overrides`], normally coming from the command line.
//!
//! Loading never checks the filesystem beyond reading the configuration file
//! itself; call [`Config::validate`] before starting a run.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Environment variable prefix for configuration values.
pub const ENV_PREFIX: &str = "ZIMPACK_";
/// Default size (in KiB) under which the archive writer keeps filling a chunk.
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 2048;
/// Default number of discovered paths allowed to wait for the consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Everything a packaging run needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the directory tree to package.
    pub source: PathBuf,
    /// Where the archive writer persists its output.
    pub output: PathBuf,
    /// Content language, e.g. `eng`.
    pub language: String,
    pub creator: String,
    pub publisher: String,
    pub title: String,
    pub description: String,
    /// Entry id (path relative to `source`) of the main page.
    pub welcome: String,
    /// Entry id (path relative to `source`) of the favicon.
    pub favicon: String,
    /// Minimum chunk size in KiB, passed through to the archive writer.
    pub min_chunk_size: usize,
    /// Upper bound of discovered paths waiting to be packaged.
    pub queue_capacity: usize,
    /// Optional tab-separated file of additional redirects.
    pub redirects: Option<PathBuf>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            output: PathBuf::new(),
            language: String::new(),
            creator: String::new(),
            publisher: String::new(),
            title: String::new(),
            description: String::new(),
            welcome: String::new(),
            favicon: String::new(),
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            redirects: None,
        }
    }
}

/// Values that take precedence over every other configuration layer.
///
/// Unset fields are skipped during serialization so they never mask a value
/// coming from a lower layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirects: Option<PathBuf>,
}

impl Config {
    /// Location of the configuration file used when none is given explicitly.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "zimpack").map(|dirs| dirs.config_dir().join("zimpack.toml"))
    }

    /// Builds the layered [`Figment`] without extracting it.
    ///
    /// An explicitly requested file must exist; the implicit default file is
    /// only merged when present.
    pub fn figment(file: Option<&Path>, overrides: &Overrides) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
                }
                figment = Self::merge_file(figment, path);
            },
            None => {
                if let Some(path) = Self::default_file().filter(|p| p.is_file()) {
                    tracing::debug!(path = %path.display(), "Using default configuration file");
                    figment = Self::merge_file(figment, &path);
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)).merge(Serialized::defaults(overrides)))
    }

    fn merge_file(figment: Figment, path: &Path) -> Figment {
        let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        }
    }

    /// Loads the configuration from every layer.
    #[instrument(skip(overrides))]
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::figment(file, overrides)?.extract().or_raise(|| ErrorKind::Load)
    }

    /// Checks everything that must hold before traversal starts.
    ///
    /// All free-text fields are required, the source must be a directory, and
    /// both the welcome page and the favicon must exist inside it.
    pub fn validate(&self) -> Result<()> {
        let required: [(&'static str, &str); 7] = [
            ("language", &self.language),
            ("creator", &self.creator),
            ("publisher", &self.publisher),
            ("title", &self.title),
            ("description", &self.description),
            ("welcome", &self.welcome),
            ("favicon", &self.favicon),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                exn::bail!(ErrorKind::MissingField(field));
            }
        }
        if self.source.as_os_str().is_empty() {
            exn::bail!(ErrorKind::MissingField("source"));
        }
        if self.output.as_os_str().is_empty() {
            exn::bail!(ErrorKind::MissingField("output"));
        }
        if !self.source.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(self.source.clone()));
        }
        for referenced in [&self.welcome, &self.favicon] {
            let path = self.source.join(referenced);
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path));
            }
        }
        if let Some(redirects) = &self.redirects
            && !redirects.is_file()
        {
            exn::bail!(ErrorKind::MissingFile(redirects.clone()));
        }
        if self.queue_capacity == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "queue_capacity",
                value: self.queue_capacity.to_string(),
            });
        }
        if self.min_chunk_size == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "min_chunk_size",
                value: self.min_chunk_size.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    fn valid(source: &Path) -> Config {
        fs::write(source.join("index.html"), "<html></html>").unwrap();
        fs::write(source.join("favicon.png"), [0x89, 0x50, 0x4E, 0x47]).unwrap();
        Config {
            source: source.to_path_buf(),
            output: source.join("out.zim"),
            language: "eng".to_string(),
            creator: "Creator".to_string(),
            publisher: "Publisher".to_string(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            welcome: "index.html".to_string(),
            favicon: "favicon.png".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.min_chunk_size, DEFAULT_MIN_CHUNK_SIZE);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.redirects.is_none());
    }

    #[test]
    fn valid_config_passes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(valid(dir.path()).validate().is_ok());
    }

    #[rstest]
    #[case("language")]
    #[case("creator")]
    #[case("publisher")]
    #[case("title")]
    #[case("description")]
    #[case("welcome")]
    #[case("favicon")]
    fn missing_free_text_field(#[case] field: &'static str) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid(dir.path());
        match field {
            "language" => config.language.clear(),
            "creator" => config.creator.clear(),
            "publisher" => config.publisher.clear(),
            "title" => config.title.clear(),
            "description" => config.description.clear(),
            "welcome" => config.welcome.clear(),
            "favicon" => config.favicon.clear(),
            _ => unreachable!(),
        }
        let err = config.validate().unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField(field));
    }

    #[test]
    fn missing_favicon_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid(dir.path());
        config.favicon = "missing.png".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(*err, ErrorKind::MissingFile(dir.path().join("missing.png")));
    }

    #[test]
    fn missing_welcome_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid(dir.path());
        config.welcome = "A/Main_Page.html".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingFile(_)));
    }

    #[test]
    fn source_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid(dir.path());
        config.source = dir.path().join("index.html");
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }

    #[test]
    fn zero_queue_capacity_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = valid(dir.path());
        config.queue_capacity = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid { field: "queue_capacity", .. }));
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = Config::load(Some(&missing), &Overrides::default()).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingFile(missing));
    }

    #[test]
    fn file_layer_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("zimpack.toml");
        fs::write(
            &file,
            "title = \"From File\"\ncreator = \"File Creator\"\nmin_chunk_size = 512\n",
        )
        .unwrap();
        let overrides = Overrides {
            title: Some("From CLI".to_string()),
            ..Overrides::default()
        };
        let config = Config::load(Some(&file), &overrides).unwrap();
        assert_eq!(config.title, "From CLI");
        assert_eq!(config.creator, "File Creator");
        assert_eq!(config.min_chunk_size, 512);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn yaml_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("zimpack.yaml");
        fs::write(&file, "language: fra\nwelcome: accueil.html\n").unwrap();
        let config = Config::load(Some(&file), &Overrides::default()).unwrap();
        assert_eq!(config.language, "fra");
        assert_eq!(config.welcome, "accueil.html");
    }
}
