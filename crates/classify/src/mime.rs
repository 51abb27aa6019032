//! Static MIME knowledge: the extension override table, font types, and
//! parameter stripping.

/// Font MIME types that stylesheets are allowed to embed as `data:` URIs.
pub const EMBEDDABLE_FONTS: &[&str] = &[
    "application/font-ttf",
    "application/font-woff",
    "application/vnd.ms-opentype",
    "font/ttf",
    "font/otf",
    "font/woff",
    "font/woff2",
];

/// Non-text application types that still belong with stylesheets and scripts.
const AUXILIARY_APPLICATIONS: &[&str] = &["application/javascript", "application/json"];

/// Returns the MIME type for a well-known file extension (case-insensitive).
///
/// These always win over content sniffing: sniffers routinely report
/// stylesheets and scripts as `text/plain`, which would misfile them.
///
/// ```
/// use zimpack_classify::mime_type_for_extension;
/// assert_eq!(mime_type_for_extension("CSS"), Some("text/css"));
/// assert_eq!(mime_type_for_extension("unknown"), None);
/// ```
pub fn mime_type_for_extension(extension: &str) -> Option<&'static str> {
    Some(match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "tiff" | "tif" => "image/tiff",
        "jpeg" | "jpg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "xml" => "text/xml",
        "pdf" => "application/pdf",
        "ogg" => "application/ogg",
        "js" => "application/javascript",
        "json" => "application/json",
        "css" => "text/css",
        "otf" => "application/vnd.ms-opentype",
        "ttf" => "application/font-ttf",
        "woff" => "application/font-woff",
        "woff2" => "font/woff2",
        "vtt" => "text/vtt",
        _ => return None,
    })
}

/// Extension of the last `/`-separated segment, if it has one.
pub(crate) fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&name[dot + 1..]),
    }
}

/// Drops any parameter suffix (`; charset=...`) from a MIME type.
///
/// ```
/// use zimpack_classify::strip_parameters;
/// assert_eq!(strip_parameters("text/html; charset=utf-8"), "text/html");
/// assert_eq!(strip_parameters("image/png"), "image/png");
/// ```
pub fn strip_parameters(mime_type: &str) -> &str {
    match mime_type.find(';') {
        Some(found) => mime_type[..found].trim(),
        None => mime_type.trim(),
    }
}

/// Returns `true` for font types that may be inlined into stylesheets.
pub fn is_embeddable_font(mime_type: &str) -> bool {
    EMBEDDABLE_FONTS.contains(&mime_type)
}

pub(crate) fn is_auxiliary_application(mime_type: &str) -> bool {
    is_embeddable_font(mime_type) || AUXILIARY_APPLICATIONS.contains(&mime_type)
}
