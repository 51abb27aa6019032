//! Content sniffing: identifying a file from its leading bytes.
//!
//! References:
//! https://www.garykessler.net/library/file_sigs.html
//! https://mimesniff.spec.whatwg.org/

use crate::error::{ErrorKind, Result};
use memchr::{memchr, memmem};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected when sniffing.
pub const SNIFF_BYTES: u64 = 8 * 1024;

/// Identifies a file's MIME type from its contents.
///
/// The returned value may carry parameters (`text/plain; charset=utf-8`);
/// callers strip them. `Ok(None)` means the sniffer has no opinion.
pub trait Sniffer: Send + Sync {
    fn sniff(&self, path: &Path) -> Result<Option<String>>;
}

struct Signature {
    offset: usize,
    magic: &'static [u8],
    mime_type: &'static str,
}

macro_rules! signature {
    ($offset:expr, $magic:expr, $mime:expr) => {
        Signature {
            offset: $offset,
            magic: $magic,
            mime_type: $mime,
        }
    };
}

const SIGNATURES: &[Signature] = &[
    signature!(0, &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
    signature!(0, &[0xFF, 0xD8, 0xFF], "image/jpeg"),
    signature!(0, b"GIF87a", "image/gif"),
    signature!(0, b"GIF89a", "image/gif"),
    signature!(8, b"WEBP", "image/webp"),
    signature!(0, b"BM", "image/bmp"),
    signature!(0, &[0x00, 0x00, 0x01, 0x00], "image/x-icon"),
    signature!(0, &[0x49, 0x49, 0x2A, 0x00], "image/tiff"),
    signature!(0, &[0x4D, 0x4D, 0x00, 0x2A], "image/tiff"),
    signature!(0, b"%PDF-", "application/pdf"),
    signature!(0, b"OggS", "application/ogg"),
    signature!(0, b"ID3", "audio/mpeg"),
    signature!(8, b"WAVE", "audio/x-wav"),
    signature!(0, b"fLaC", "audio/flac"),
    signature!(4, b"ftyp", "video/mp4"),
    signature!(0, &[0x1A, 0x45, 0xDF, 0xA3], "video/webm"),
    signature!(0, b"wOFF", "application/font-woff"),
    signature!(0, b"wOF2", "font/woff2"),
    signature!(0, b"OTTO", "application/vnd.ms-opentype"),
    signature!(0, &[0x00, 0x01, 0x00, 0x00, 0x00], "application/font-ttf"),
    signature!(0, b"PK\x03\x04", "application/zip"),
    signature!(0, &[0x1F, 0x8B], "application/gzip"),
];

/// Default [`Sniffer`]: a table of magic numbers plus a markup heuristic for
/// text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;
impl MagicSniffer {
    /// Identifies an in-memory file head.
    ///
    /// ```
    /// use zimpack_classify::MagicSniffer;
    /// assert_eq!(MagicSniffer::sniff_bytes(b"GIF89a..."), "image/gif");
    /// assert_eq!(MagicSniffer::sniff_bytes(b"<!DOCTYPE html><html>"), "text/html; charset=us-ascii");
    /// ```
    pub fn sniff_bytes(head: &[u8]) -> String {
        if head.is_empty() {
            return "application/x-empty".to_string();
        }
        for signature in SIGNATURES {
            if head.len() >= signature.offset + signature.magic.len()
                && &head[signature.offset..signature.offset + signature.magic.len()] == signature.magic
            {
                return signature.mime_type.to_string();
            }
        }
        if memchr(0, head).is_some() {
            return "application/octet-stream".to_string();
        }
        let charset = match std::str::from_utf8(head) {
            Ok(text) if text.is_ascii() => "us-ascii",
            Ok(_) => "utf-8",
            // A multi-byte character cut off by the sniffing window.
            Err(err) if err.error_len().is_none() => "utf-8",
            Err(_) => "iso-8859-1",
        };
        let lower = head.to_ascii_lowercase();
        let trimmed = lower.strip_prefix(b"\xef\xbb\xbf".as_slice()).unwrap_or(lower.as_slice());
        let start = trimmed.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(trimmed.len());
        let trimmed = &trimmed[start..];
        let mime_type = if trimmed.starts_with(b"<!doctype html") || memmem::find(trimmed, b"<html").is_some() {
            "text/html"
        } else if trimmed.starts_with(b"<svg") || (trimmed.starts_with(b"<?xml") && memmem::find(trimmed, b"<svg").is_some()) {
            return "image/svg+xml".to_string();
        } else if trimmed.starts_with(b"<?xml") {
            "text/xml"
        } else {
            "text/plain"
        };
        format!("{mime_type}; charset={charset}")
    }
}
impl Sniffer for MagicSniffer {
    fn sniff(&self, path: &Path) -> Result<Option<String>> {
        let file = File::open(path).map_err(|e| ErrorKind::from_io(e, path))?;
        let mut head = Vec::with_capacity(SNIFF_BYTES as usize);
        file.take(SNIFF_BYTES).read_to_end(&mut head).map_err(|e| ErrorKind::from_io(e, path))?;
        Ok(Some(Self::sniff_bytes(&head)))
    }
}
