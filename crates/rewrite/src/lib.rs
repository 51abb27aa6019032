//! Content rewriting for packaged HTML and CSS.
//!
//! Links inside the source tree are relative to the file that contains them.
//! Inside the archive every entry lives under a namespace directory, so each
//! local link is resolved to a path within the tree, classified, and
//! recomputed as a relative URL between the two namespace-qualified URLs.
//! Stylesheet references to embeddable fonts are inlined as `data:` URIs
//! instead.

mod consts;
pub mod css;
pub mod html;
pub mod url;

pub use crate::html::Document;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashMap;
use tracing::instrument;
use zimpack_classify::{Classifier, is_embeddable_font};

/// Rewrites links in HTML and CSS payloads.
///
/// Holds the URL cache: resolved target path to namespace-qualified URL, so
/// that a target referenced from many documents is classified only once.
#[derive(Debug, Default)]
pub struct Rewriter {
    urls: HashMap<String, String>,
}
impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Namespace-qualified absolute URL (`/I/img/logo.png`) of a resolved,
    /// still percent-encoded path within the tree.
    pub fn qualified_url(&mut self, classifier: &mut Classifier, path: &str) -> String {
        if let Some(cached) = self.urls.get(path) {
            return cached.clone();
        }
        let namespace = classifier.namespace_for(&url::decode(path));
        let qualified = format!("/{namespace}/{path}");
        self.urls.insert(path.to_string(), qualified.clone());
        qualified
    }

    /// The rewritten form of `link` as found in the entry `id`, or [`None`]
    /// if the link is not local or has no path to resolve.
    pub fn rewrite_link(&mut self, classifier: &mut Classifier, id: &str, link: &str) -> Option<String> {
        let link = link.trim();
        if !url::is_local(link) {
            return None;
        }
        let (path, suffix) = url::split_suffix(link);
        if path.is_empty() {
            return None;
        }
        if url::escapes_root(id, path) {
            tracing::warn!(id, link, "Link climbs above the tree root");
        }
        let resolved = url::resolve(id, path);
        if resolved.is_empty() {
            return None;
        }
        let target = self.qualified_url(classifier, &resolved);
        let base = format!("/{}/{}", classifier.namespace_for(id), id);
        Some(format!("{}{}", url::relative(&base, &target), suffix))
    }

    /// Rewrites every local `href` and `src` attribute of an HTML document.
    #[instrument(level = "trace", skip(self, classifier, html), fields(len = html.len()))]
    pub fn rewrite_html(&mut self, classifier: &mut Classifier, id: &str, html: &[u8]) -> Vec<u8> {
        let links = Document::parse(html).links();
        let replacements: HashMap<String, String> = links
            .into_iter()
            .filter_map(|link| {
                let rewritten = self.rewrite_link(classifier, id, &link)?;
                (rewritten != link).then_some((link, rewritten))
            })
            .collect();
        html::replace_links(html, &replacements)
    }

    /// Rewrites every local `url(...)` of a stylesheet, inlining embeddable
    /// fonts.
    #[instrument(level = "trace", skip(self, classifier, css), fields(len = css.len()))]
    pub fn rewrite_css(&mut self, classifier: &mut Classifier, id: &str, css: &[u8]) -> Vec<u8> {
        css::replace_references(css, |value| {
            if !url::is_local(value) {
                return None;
            }
            if let Some(target) = url::resolve_id(id, value) {
                let mime_type = classifier.mime_type_for(&target);
                if is_embeddable_font(&mime_type) {
                    let path = classifier.root().join(&target);
                    match std::fs::read(&path) {
                        Ok(bytes) => {
                            tracing::debug!(id, font = %target, "Inlining font");
                            return Some(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)));
                        },
                        Err(err) => {
                            tracing::warn!(id, path = %path.display(), error = %err, "Unable to inline font");
                        },
                    }
                }
            }
            self.rewrite_link(classifier, id, value)
        })
    }

    /// Rewrites a payload according to its MIME type; only `text/html` and
    /// `text/css` are touched.
    pub fn rewrite(&mut self, classifier: &mut Classifier, id: &str, mime_type: &str, payload: Vec<u8>) -> Vec<u8> {
        match mime_type {
            "text/html" => self.rewrite_html(classifier, id, &payload),
            "text/css" => self.rewrite_css(classifier, id, &payload),
            _ => payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn tree(files: &[(&str, &[u8])]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, contents) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
        dir
    }

    fn classifier(root: &Path) -> Classifier {
        Classifier::with_magic(root)
    }

    #[rstest]
    #[case("index.html", "style.css", Some("../-/style.css"))]
    #[case("index.html", "img/logo.png#x", Some("../I/img/logo.png#x"))]
    #[case("index.html", "page.html?q=1", Some("page.html?q=1"))]
    #[case("a/x.html", "../y.css", Some("../../-/y.css"))]
    #[case("b/y.css", "../a/x.html", Some("../../A/a/x.html"))]
    #[case("index.html", "https://example.org/", None)]
    #[case("index.html", "#top", None)]
    #[case("index.html", "?only=query", None)]
    fn test_rewrite_link(#[case] id: &str, #[case] link: &str, #[case] expected: Option<&str>) {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        assert_eq!(rewriter.rewrite_link(&mut classifier, id, link).as_deref(), expected);
    }

    /// Two documents in sibling directories reach each other across namespaces.
    #[test]
    fn test_cross_directory_links_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        for (id, link, target) in [("a/x.html", "../y.css", "/-/y.css"), ("b/y.css", "../a/x.html", "/A/a/x.html")] {
            let rewritten = rewriter.rewrite_link(&mut classifier, id, link).unwrap();
            let base = format!("{}/{id}", classifier.namespace_for(id));
            assert_eq!(format!("/{}", url::resolve(&base, &rewritten)), target);
        }
    }

    #[test]
    fn test_rewrite_html() {
        let dir = tree(&[("img/logo.png", b"\x89PNG\r\n\x1a\n"), ("style.css", b"")]);
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        let html = br##"<html><head><title>Home</title><link rel="stylesheet" href="style.css"></head>
<body><p>style.css</p><img src="img/logo.png"><a href="https://example.org/">out</a><a href="#top">top</a></body></html>"##;
        let out = String::from_utf8(rewriter.rewrite_html(&mut classifier, "index.html", html)).unwrap();
        assert!(out.contains(r#"href="../-/style.css""#), "{out}");
        assert!(out.contains(r#"src="../I/img/logo.png""#), "{out}");
        assert!(out.contains("<p>style.css</p>"), "{out}");
        assert!(out.contains(r#"href="https://example.org/""#), "{out}");
        assert!(out.contains(r##"href="#top""##), "{out}");
    }

    #[test]
    fn test_rewrite_css_inlines_fonts() {
        let font: &[u8] = b"wOFF\x00\x01\x00\x00\xde\xad\xbe\xef";
        let dir = tree(&[("fonts/f.woff", font), ("img/bg.png", b"\x89PNG\r\n\x1a\n")]);
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        let css = b"@font-face { src: url('fonts/f.woff'); } body { background: url(img/bg.png) } i { background: url(data:image/png;base64,AA==) }";
        let out = String::from_utf8(rewriter.rewrite_css(&mut classifier, "style.css", css)).unwrap();
        assert!(out.contains("url(../I/img/bg.png)"), "{out}");
        assert!(out.contains("url(data:image/png;base64,AA==)"), "{out}");

        let prefix = "url('data:application/font-woff;base64,";
        let start = out.find(prefix).unwrap() + prefix.len();
        let end = start + out[start..].find('\'').unwrap();
        assert_eq!(STANDARD.decode(&out[start..end]).unwrap(), font);
    }

    #[test]
    fn test_rewrite_css_missing_font_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        let out = rewriter.rewrite_css(&mut classifier, "css/site.css", b"x{src:url(../fonts/gone.ttf)}");
        assert_eq!(out, b"x{src:url(../fonts/gone.ttf)}".to_vec());
    }

    #[test]
    fn test_url_cache() {
        let dir = tree(&[("logo", b"\x89PNG\r\n\x1a\n")]);
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        assert_eq!(rewriter.qualified_url(&mut classifier, "logo"), "/I/logo");
        fs::remove_file(dir.path().join("logo")).unwrap();
        assert_eq!(rewriter.qualified_url(&mut classifier, "logo"), "/I/logo");
    }

    #[test]
    fn test_percent_encoded_targets_are_classified_decoded() {
        let dir = tree(&[("my logo", b"GIF89a")]);
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        assert_eq!(
            rewriter.rewrite_link(&mut classifier, "index.html", "my%20logo").as_deref(),
            Some("../I/my%20logo")
        );
    }

    #[test]
    fn test_other_payloads_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut classifier = classifier(dir.path());
        let mut rewriter = Rewriter::new();
        let payload = br#"<a href="x.html">"#.to_vec();
        assert_eq!(rewriter.rewrite(&mut classifier, "x.txt", "text/plain", payload.clone()), payload);
    }
}
