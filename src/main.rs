mod error;

use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use zimpack_config::{Config, Overrides};
use zimpack_source::{ArchiveWriter, Context, DumpWriter, EntrySource, TreeWalker, path_queue, read_redirects};

/// Package a directory of web content into a self-contained offline archive.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory containing the HTML pages and their assets
    source: Option<PathBuf>,

    /// Where to write the packaged output
    output: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Content language, e.g. "eng"
    #[arg(short, long)]
    language: Option<String>,

    #[arg(short, long)]
    creator: Option<String>,

    #[arg(short, long)]
    publisher: Option<String>,

    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// Path of the main page, relative to SOURCE
    #[arg(short, long)]
    welcome: Option<String>,

    /// Path of the favicon, relative to SOURCE
    #[arg(short, long)]
    favicon: Option<String>,

    /// Minimum chunk size in KiB
    #[arg(short, long)]
    min_chunk_size: Option<usize>,

    /// Maximum number of discovered files waiting to be packaged
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Tab-separated file of additional redirects
    #[arg(short, long)]
    redirects: Option<PathBuf>,

    /// Log every packaging decision
    #[arg(short, long)]
    verbose: bool,
}
impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            source: self.source.clone(),
            output: self.output.clone(),
            language: self.language.clone(),
            creator: self.creator.clone(),
            publisher: self.publisher.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            welcome: self.welcome.clone(),
            favicon: self.favicon.clone(),
            min_chunk_size: self.min_chunk_size,
            queue_capacity: self.queue_capacity,
            redirects: self.redirects.clone(),
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref(), &cli.overrides()).or_raise(|| ErrorKind::Config)?;
    config.validate().or_raise(|| ErrorKind::Config)?;
    let redirects = match &config.redirects {
        Some(path) => read_redirects(path).or_raise(|| ErrorKind::Config)?,
        None => Vec::new(),
    };
    tracing::info!(
        source = %config.source.display(),
        output = %config.output.display(),
        redirects = redirects.len(),
        "Packaging"
    );

    let runtime = tokio::runtime::Runtime::new().or_raise(|| ErrorKind::Runtime)?;
    let (sender, queue) = path_queue(config.queue_capacity);
    let walker = TreeWalker::new(&config.source, sender).spawn(runtime.handle());

    let mut source = EntrySource::new(Context::new(&config), queue, redirects);
    let mut writer = DumpWriter::new(&config.output, config.min_chunk_size);
    let written = writer.write(&mut source).or_raise(|| ErrorKind::Package)?;
    runtime
        .block_on(walker)
        .or_raise(|| ErrorKind::Package)?
        .or_raise(|| ErrorKind::Package)?;

    let stats = source.stats();
    for (mime_type, count) in source.counters().iter() {
        tracing::debug!(mime_type, count, "Packaged");
    }
    tracing::info!(
        entries = stats.entries,
        redirects = stats.redirects,
        dropped = stats.dropped,
        bytes = written.bytes,
        "Finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
