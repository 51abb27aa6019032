use crate::mime::is_auxiliary_application;
use std::fmt;

/// Single-character partition of archive entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// `A`: HTML body content.
    Content,
    /// `-`: auxiliary non-HTML text, stylesheets, scripts and fonts.
    Auxiliary,
    /// `I`: images and any other binary payload.
    Image,
    /// `M`: archive-level metadata.
    Metadata,
}
impl Namespace {
    pub const fn as_char(self) -> char {
        match self {
            Self::Content => 'A',
            Self::Auxiliary => '-',
            Self::Image => 'I',
            Self::Metadata => 'M',
        }
    }

    /// Maps a (parameter-free) MIME type to the namespace its entry lives in.
    ///
    /// An empty MIME type means nothing could identify the file, and it is
    /// packaged as HTML body content.
    ///
    /// ```
    /// use zimpack_classify::Namespace;
    /// assert_eq!(Namespace::for_mime_type("text/html"), Namespace::Content);
    /// assert_eq!(Namespace::for_mime_type(""), Namespace::Content);
    /// assert_eq!(Namespace::for_mime_type("text/css"), Namespace::Auxiliary);
    /// assert_eq!(Namespace::for_mime_type("application/font-woff"), Namespace::Auxiliary);
    /// assert_eq!(Namespace::for_mime_type("image/png"), Namespace::Image);
    /// ```
    pub fn for_mime_type(mime_type: &str) -> Self {
        if mime_type.is_empty() || mime_type.starts_with("text/html") {
            Self::Content
        } else if mime_type.starts_with("text") || is_auxiliary_application(mime_type) {
            Self::Auxiliary
        } else {
            Self::Image
        }
    }
}
impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
impl TryFrom<char> for Namespace {
    type Error = char;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'A' => Ok(Self::Content),
            '-' => Ok(Self::Auxiliary),
            'I' => Ok(Self::Image),
            'M' => Ok(Self::Metadata),
            other => Err(other),
        }
    }
}
