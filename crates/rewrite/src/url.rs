//! Path and URL arithmetic over `/`-separated strings.
//!
//! Nothing here touches the filesystem or depends on the host's path
//! separator: entry ids and archive URLs are always `/`-separated.

use std::borrow::Cow;

/// Schemes that never point inside the packaged tree.
const NON_LOCAL_SCHEMES: &[&str] = &["tel", "geo", "mailto", "javascript", "data", "sms", "callto", "about", "blob"];

/// Returns `true` if `url` should be resolved against the packaged tree.
///
/// Empty values and pure in-page anchors are never local. Anything with a
/// `scheme://` authority, a protocol-relative `//host`, or a known non-local
/// scheme (`tel:`, `geo:`, `mailto:`, `data:`, ...) is external.
///
/// ```
/// use zimpack_rewrite::url::is_local;
/// assert!(is_local("../img/logo.png"));
/// assert!(is_local("Main_Page.html#History"));
/// assert!(!is_local("#top"));
/// assert!(!is_local("https://example.org/"));
/// assert!(!is_local("tel:+123456"));
/// ```
pub fn is_local(url: &str) -> bool {
    let url = url.trim();
    if url.is_empty() || url.starts_with('#') || url.starts_with("//") {
        return false;
    }
    let Some(colon) = url.find(':') else {
        return true;
    };
    let scheme = &url[..colon];
    // A colon after the first path, query or fragment delimiter is not a scheme.
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    if url[colon..].starts_with("://") {
        return false;
    }
    !NON_LOCAL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
}

/// Splits a link into its path and its `?query`/`#fragment` suffix.
///
/// ```
/// use zimpack_rewrite::url::split_suffix;
/// assert_eq!(split_suffix("a/b.html#sec?x"), ("a/b.html", "#sec?x"));
/// assert_eq!(split_suffix("a/b.html"), ("a/b.html", ""));
/// ```
pub fn split_suffix(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(at) => link.split_at(at),
        None => (link, ""),
    }
}

/// Resolves `link` against the directory of the entry `base`.
///
/// `.` and empty segments are dropped and `..` climbs one directory; climbing
/// above the tree root stays at the root. A leading `/` makes the link
/// relative to the tree root.
///
/// ```
/// use zimpack_rewrite::url::resolve;
/// assert_eq!(resolve("a/x.html", "../y.css"), "y.css");
/// assert_eq!(resolve("a/b/x.html", "./c/../d.png"), "a/b/d.png");
/// assert_eq!(resolve("a/x.html", "/img/logo.png"), "img/logo.png");
/// assert_eq!(resolve("style.css", "../img/logo.png"), "img/logo.png");
/// ```
pub fn resolve(base: &str, link: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    if !link.starts_with('/') {
        segments.extend(base.split('/').filter(|s| !s.is_empty() && *s != "."));
        // Drop the referencing entry's own name.
        segments.pop();
    }
    for segment in link.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Returns `true` if resolving `link` from `base` climbs above the tree root.
pub fn escapes_root(base: &str, link: &str) -> bool {
    let mut depth = if link.starts_with('/') {
        0
    } else {
        base.split('/').filter(|s| !s.is_empty() && *s != ".").count().saturating_sub(1)
    };
    for segment in link.split('/') {
        match segment {
            "" | "." => {},
            ".." if depth == 0 => return true,
            ".." => depth -= 1,
            _ => depth += 1,
        }
    }
    false
}

/// Computes the relative URL leading from the document at `from` to `to`.
///
/// Both arguments are absolute (`/`-prefixed) archive URLs, namespace
/// segment included, so links that cross namespaces get the right number of
/// `../` hops.
///
/// ```
/// use zimpack_rewrite::url::relative;
/// assert_eq!(relative("/A/index.html", "/-/style.css"), "../-/style.css");
/// assert_eq!(relative("/A/a/x.html", "/A/a/y.html"), "y.html");
/// assert_eq!(relative("/-/b/y.css", "/A/a/x.html"), "../../A/a/x.html");
/// ```
pub fn relative(from: &str, to: &str) -> String {
    let from_segments: Vec<&str> = from.split('/').collect();
    let to_segments: Vec<&str> = to.split('/').collect();
    let from_dirs = &from_segments[..from_segments.len().saturating_sub(1)];
    let to_dirs = &to_segments[..to_segments.len().saturating_sub(1)];
    let common = from_dirs.iter().zip(to_dirs).take_while(|(a, b)| a == b).count();
    let mut relative = "../".repeat(from_dirs.len() - common);
    relative.push_str(&to_segments[common..].join("/"));
    relative
}

/// Percent-decodes a path; invalid UTF-8 sequences are replaced.
///
/// ```
/// use zimpack_rewrite::url::decode;
/// assert_eq!(decode("My%20Page.html"), "My Page.html");
/// assert_eq!(decode("100%"), "100%");
/// ```
pub fn decode(path: &str) -> String {
    let bytes = urlencoding::decode_binary(path.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Resolves a link to the entry id (decoded path relative to the tree root)
/// it points at. Suffixes are discarded.
pub fn resolve_id(base: &str, link: &str) -> Option<String> {
    let (path, _) = split_suffix(link.trim());
    if path.is_empty() {
        return None;
    }
    let resolved = resolve(base, path);
    (!resolved.is_empty()).then(|| decode(&resolved))
}

/// Derives a human title from an entry id: the file name without its
/// extension, underscores turned into spaces.
///
/// ```
/// use zimpack_rewrite::url::title_from_filename;
/// assert_eq!(title_from_filename("wiki/Main_Page.html"), "Main Page");
/// assert_eq!(title_from_filename("README"), "README");
/// ```
pub fn title_from_filename(id: &str) -> String {
    let name = id.rsplit('/').next().unwrap_or(id);
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    stem.replace('_', " ")
}

/// Escapes a value for use inside an HTML attribute delimited by `quote`.
pub(crate) fn escape_attribute(value: &str, quote: Option<u8>) -> Cow<'_, str> {
    let needs_quote_escape = |c: char| match quote {
        Some(b'"') => c == '"',
        Some(b'\'') => c == '\'',
        _ => false,
    };
    if !value.contains(|c: char| c == '&' || needs_quote_escape(c)) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' if needs_quote_escape(c) => escaped.push_str("&quot;"),
            '\'' if needs_quote_escape(c) => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Decodes the character references that commonly appear in raw attribute
/// values, so they compare equal to the parsed DOM value.
pub(crate) fn unescape_attribute(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').and_then(|semi| {
            let reference = &rest[1..semi];
            let c = match reference {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "lt" => Some('<'),
                "gt" => Some('>'),
                _ => {
                    if let Some(hex) = reference.strip_prefix("#x").or_else(|| reference.strip_prefix("#X")) {
                        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                    } else if let Some(dec) = reference.strip_prefix('#') {
                        dec.parse::<u32>().ok().and_then(char::from_u32)
                    } else {
                        None
                    }
                },
            };
            c.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
            },
            None => {
                out.push('&');
                rest = &rest[1..];
            },
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("page.html", true)]
    #[case("../a/b.png", true)]
    #[case("/root.html", true)]
    #[case("File:Image.png", true)]
    #[case("a/b:c.html", true)]
    #[case("", false)]
    #[case("   ", false)]
    #[case("#anchor", false)]
    #[case("http://example.org", false)]
    #[case("HTTPS://example.org", false)]
    #[case("ftp://example.org/file", false)]
    #[case("//cdn.example.org/lib.js", false)]
    #[case("tel:+44123", false)]
    #[case("geo:51.5,0.1", false)]
    #[case("mailto:someone@example.org", false)]
    #[case("javascript:void(0)", false)]
    #[case("data:image/png;base64,AAAA", false)]
    fn test_is_local(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_local(url), expected, "{url}");
    }

    #[rstest]
    #[case("index.html", "style.css", "style.css")]
    #[case("index.html", "img/logo.png", "img/logo.png")]
    #[case("a/x.html", "../y.css", "y.css")]
    #[case("b/y.css", "../a/x.html", "a/x.html")]
    #[case("a/b/c.html", "../../d.html", "d.html")]
    #[case("a/b/c.html", ".././/./e.html", "a/e.html")]
    #[case("a/b/c.html", "/top.html", "top.html")]
    #[case("a/c.html", "../../escape.html", "escape.html")]
    #[case("a/c.html", "sub/", "a/sub")]
    fn test_resolve(#[case] base: &str, #[case] link: &str, #[case] expected: &str) {
        assert_eq!(resolve(base, link), expected);
    }

    #[rstest]
    #[case("index.html", "img/logo.png", false)]
    #[case("a/c.html", "../x.html", false)]
    #[case("a/c.html", "../../x.html", true)]
    #[case("style.css", "../img/logo.png", true)]
    #[case("a/c.html", "/../x.html", true)]
    #[case("a/c.html", "b/../../x.html", false)]
    fn test_escapes_root(#[case] base: &str, #[case] link: &str, #[case] expected: bool) {
        assert_eq!(escapes_root(base, link), expected);
    }

    #[rstest]
    #[case("/A/index.html", "/-/style.css", "../-/style.css")]
    #[case("/A/index.html", "/I/img/logo.png", "../I/img/logo.png")]
    #[case("/-/style.css", "/I/img/logo.png", "../I/img/logo.png")]
    #[case("/A/a/x.html", "/-/y.css", "../../-/y.css")]
    #[case("/-/b/y.css", "/A/a/x.html", "../../A/a/x.html")]
    #[case("/A/index.html", "/A/index.html", "index.html")]
    #[case("/A/a/b/c.html", "/A/a/d.html", "../d.html")]
    fn test_relative(#[case] from: &str, #[case] to: &str, #[case] expected: &str) {
        assert_eq!(relative(from, to), expected);
    }

    /// Resolving the computed relative URL from the referencing document
    /// must land on the target again.
    #[rstest]
    #[case("/A/index.html", "/-/style.css")]
    #[case("/A/a/b/c/deep.html", "/I/img/logo.png")]
    #[case("/-/b/y.css", "/A/a/x.html")]
    #[case("/I/x.png", "/I/x.png")]
    fn test_relative_round_trip(#[case] from: &str, #[case] to: &str) {
        let rel = relative(from, to);
        let resolved = resolve(&from[1..], &rel);
        assert_eq!(format!("/{resolved}"), to);
    }

    #[test]
    fn test_resolve_id() {
        assert_eq!(resolve_id("a/x.html", "../My%20Page.html#top").as_deref(), Some("My Page.html"));
        assert_eq!(resolve_id("a/x.html", "?query"), None);
        assert_eq!(resolve_id("a/x.html", ".."), None);
    }

    #[rstest]
    #[case("Main_Page.html", "Main Page")]
    #[case("dir/some_file.tar.gz", "some file.tar")]
    #[case(".hidden", ".hidden")]
    #[case("no_extension", "no extension")]
    fn test_title_from_filename(#[case] id: &str, #[case] expected: &str) {
        assert_eq!(title_from_filename(id), expected);
    }

    #[test]
    fn test_unescape_attribute() {
        assert_eq!(unescape_attribute("a.html?x=1&amp;y=2"), "a.html?x=1&y=2");
        assert_eq!(unescape_attribute("&#39;&#x41;&quot;"), "'A\"");
        assert_eq!(unescape_attribute("a & b"), "a & b");
        assert_eq!(unescape_attribute("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("a?x=1&y=2", Some(b'"')), "a?x=1&amp;y=2");
        assert_eq!(escape_attribute("it's", Some(b'\'')), "it&#39;s");
        assert_eq!(escape_attribute("it's", Some(b'"')), "it's");
    }
}
