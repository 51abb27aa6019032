use std::fmt;
use zimpack_classify::Namespace;

/// A unit handed to the archive writer.
///
/// Exactly one of "has a payload" and "is a redirect" holds: redirects carry
/// a target id instead, and their payload is never requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Run-unique identifier used to request the payload.
    pub id: String,
    pub namespace: Namespace,
    /// Location of the entry within its namespace.
    pub url: String,
    pub title: String,
    pub mime_type: String,
    /// Id of the entry this one resolves to.
    pub redirect: Option<String>,
}
impl Entry {
    /// A regular entry for a file of the source tree; its id doubles as its
    /// url.
    pub fn file(id: impl Into<String>, namespace: Namespace, title: impl Into<String>, mime_type: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            url: id.clone(),
            id,
            namespace,
            title: title.into(),
            mime_type: mime_type.into(),
            redirect: None,
        }
    }

    /// Turns the entry into a redirect to `target`.
    pub fn redirecting_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }

    /// `namespace/url`, unique across a run.
    pub fn path(&self) -> String {
        format!("{}/{}", self.namespace, self.url)
    }
}
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.redirect {
            Some(target) => write!(f, "{} -> {target}", self.path()),
            None => write!(f, "{} ({})", self.path(), self.mime_type),
        }
    }
}
