use crate::consts::{LINK_ATTRIBUTE_REGEX, LINK_SELECTOR, META_REFRESH_SELECTOR, REFRESH_URL_REGEX, TITLE_SELECTOR};
use crate::url::{escape_attribute, is_local, unescape_attribute};
use regex::bytes::Captures;
use scraper::Html;
use std::collections::{HashMap, HashSet};

/// A parsed HTML document.
///
/// Parsing is lenient and never fails; documents that are not valid UTF-8
/// are read lossily.
pub struct Document {
    html: Html,
}
impl Document {
    pub fn parse(bytes: &[u8]) -> Self {
        Self {
            html: Html::parse_document(&String::from_utf8_lossy(bytes)),
        }
    }

    /// Text of `<head><title>`, trimmed; [`None`] when absent or blank.
    pub fn title(&self) -> Option<String> {
        self.html
            .select(&TITLE_SELECTOR)
            .map(|title| title.text().collect::<String>().trim().to_string())
            .find(|title| !title.is_empty())
    }

    /// Distinct local `href`/`src` values in document order.
    pub fn links(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for element in self.html.select(&LINK_SELECTOR) {
            for attribute in ["href", "src"] {
                let Some(value) = element.value().attr(attribute) else {
                    continue;
                };
                if is_local(value) && seen.insert(value) {
                    links.push(value.to_string());
                }
            }
        }
        links
    }

    /// Target of a `<meta http-equiv="refresh" content="N;url=TARGET">` in
    /// the document head, exactly as written.
    pub fn refresh_target(&self) -> Option<String> {
        self.html
            .select(&META_REFRESH_SELECTOR)
            .filter(|meta| meta.value().attr("http-equiv").is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh")))
            .filter_map(|meta| meta.value().attr("content"))
            .find_map(|content| {
                let target = REFRESH_URL_REGEX.captures(content)?.get(1)?.as_str().trim();
                (!target.is_empty()).then(|| target.to_string())
            })
    }
}

/// Replaces the values of `href` and `src` attributes found in
/// `replacements`, leaving every other byte of the document untouched.
///
/// Keys are attribute values as the parser reports them (character
/// references decoded); the raw markup is compared after decoding the same
/// way. Replacement values are escaped for the quoting style in use.
pub fn replace_links(html: &[u8], replacements: &HashMap<String, String>) -> Vec<u8> {
    if replacements.is_empty() {
        return html.to_vec();
    }
    LINK_ATTRIBUTE_REGEX
        .replace_all(html, |caps: &Captures| {
            let (raw, quote) = match (caps.get(2), caps.get(3), caps.get(4)) {
                (Some(value), _, _) => (value, Some(b'"')),
                (_, Some(value), _) => (value, Some(b'\'')),
                (_, _, Some(value)) => (value, None),
                _ => return caps[0].to_vec(),
            };
            let raw = String::from_utf8_lossy(raw.as_bytes());
            let Some(replacement) = replacements.get(&*unescape_attribute(&raw)) else {
                return caps[0].to_vec();
            };
            let escaped = escape_attribute(replacement, quote);
            let mut out = caps[1].to_vec();
            match quote {
                Some(quote) => {
                    out.push(quote);
                    out.extend_from_slice(escaped.as_bytes());
                    out.push(quote);
                },
                // Unquoted values cannot hold whitespace or quotes.
                None if escaped.contains(|c: char| c.is_ascii_whitespace() || c == '"' || c == '\'') => {
                    out.push(b'"');
                    out.extend_from_slice(escape_attribute(replacement, Some(b'"')).as_bytes());
                    out.push(b'"');
                },
                None => out.extend_from_slice(escaped.as_bytes()),
            }
            out
        })
        .into_owned()
}
