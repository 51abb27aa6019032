//! Additional redirects read from a tab-separated file.
//!
//! One redirect per line: `namespace<TAB>url<TAB>title<TAB>target`, where
//! `target` is the id (path relative to the source root) of the entry the
//! redirect resolves to. Blank lines are ignored.

use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use zimpack_classify::Namespace;

/// Reads and parses a redirects file. Any malformed line fails the whole
/// file.
pub fn read_redirects(path: &Path) -> Result<Vec<Entry>> {
    let contents = std::fs::read_to_string(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    parse_redirects(path, &contents)
}

/// Parses the contents of a redirects file; `path` is only used in errors.
pub fn parse_redirects(path: &Path, contents: &str) -> Result<Vec<Entry>> {
    let mut redirects = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let invalid = |reason: String| ErrorKind::Redirect {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };
        let fields: Vec<&str> = line.split('\t').collect();
        let [namespace, url, title, target] = fields.as_slice() else {
            exn::bail!(invalid(format!("expected 4 tab-separated fields, found {}", fields.len())));
        };
        let mut chars = namespace.chars();
        let namespace = match (chars.next(), chars.next()) {
            (Some(c), None) => Namespace::try_from(c).map_err(|c| invalid(format!("unknown namespace '{c}'")))?,
            _ => exn::bail!(invalid(format!("namespace must be a single character, found '{namespace}'"))),
        };
        if url.is_empty() {
            exn::bail!(invalid("empty url".to_string()));
        }
        if target.is_empty() {
            exn::bail!(invalid("empty target".to_string()));
        }
        redirects.push(Entry {
            id: format!("/{namespace}/{url}"),
            namespace,
            url: url.to_string(),
            title: title.to_string(),
            mime_type: String::new(),
            redirect: Some(target.to_string()),
        });
    }
    Ok(redirects)
}
