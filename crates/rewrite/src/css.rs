use memchr::{memchr, memmem};
use std::ops::Range;

/// Byte ranges of every `url(...)` value in a stylesheet, quotes and
/// surrounding whitespace excluded, in source order.
///
/// Both quoted and unquoted forms are recognised; an unterminated reference
/// ends the scan.
pub fn url_references(css: &[u8]) -> Vec<Range<usize>> {
    let lower = css.to_ascii_lowercase();
    let finder = memmem::Finder::new(b"url(");
    let mut references = Vec::new();
    let mut cursor = 0;
    while let Some(found) = finder.find(&lower[cursor..]) {
        let mut start = cursor + found + 4;
        while css.get(start).is_some_and(u8::is_ascii_whitespace) {
            start += 1;
        }
        let (range, resume) = match css.get(start) {
            Some(&quote @ (b'"' | b'\'')) => {
                let Some(len) = memchr(quote, &css[start + 1..]) else {
                    break;
                };
                (start + 1..start + 1 + len, start + len + 2)
            },
            _ => {
                let Some(len) = memchr(b')', &css[start..]) else {
                    break;
                };
                let mut end = start + len;
                while end > start && css[end - 1].is_ascii_whitespace() {
                    end -= 1;
                }
                (start..end, start + len + 1)
            },
        };
        if !range.is_empty() {
            references.push(range);
        }
        cursor = resume;
    }
    references
}

/// Rebuilds `css` with each referenced range replaced by whatever `replace`
/// returns for its value; [`None`] keeps the original bytes.
pub fn replace_references(css: &[u8], mut replace: impl FnMut(&str) -> Option<String>) -> Vec<u8> {
    let mut out = Vec::with_capacity(css.len());
    let mut written = 0;
    for range in url_references(css) {
        let value = String::from_utf8_lossy(&css[range.clone()]);
        if let Some(replacement) = replace(&value) {
            out.extend_from_slice(&css[written..range.start]);
            out.extend_from_slice(replacement.as_bytes());
            written = range.end;
        }
    }
    out.extend_from_slice(&css[written..]);
    out
}
