use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    (bytes $name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<BytesRegex> = LazyLock::new(|| BytesRegex::new($regex).unwrap());
    };
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

selector!(LINK_SELECTOR, "[href], [src]");
selector!(TITLE_SELECTOR, "head > title");
selector!(META_REFRESH_SELECTOR, "head > meta[http-equiv]");
regex!(REFRESH_URL_REGEX, r#"(?i)url\s*=\s*['"]?\s*([^'"]*)"#);
// Unicode mode is off so that documents which are not valid UTF-8 still match byte for byte.
// Attribute names may follow a `/` or a closing quote with no whitespace in between.
regex!(
    bytes LINK_ATTRIBUTE_REGEX,
    r#"(?i-u)([\s/"'](?:href|src)\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s"'<>`=]+))"#
);
