//! Supported fragment types and the conversion legality matrix.
//!
//! Allow-listing is an exact string match, so `text/plain; charset=utf-8` is
//! its own supported type. Classification always goes through the base type
//! (parameters stripped) and lands on a [`Representation`], which is the only
//! thing the matrix and the conversion engine match on.

use std::fmt;

/// Content-Type strings a fragment may be created with.
pub const SUPPORTED_TYPES: &[&str] = &[
    "text/plain",
    "text/plain; charset=utf-8",
    "text/markdown",
    "text/html",
    "application/json",
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
];

/// Raster codecs a fragment can be stored as or re-encoded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCodec {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageCodec {
    pub const ALL: [ImageCodec; 4] = [
        ImageCodec::Png,
        ImageCodec::Jpeg,
        ImageCodec::Webp,
        ImageCodec::Gif,
    ];

    pub fn subtype(&self) -> &'static str {
        match self {
            ImageCodec::Png => "png",
            ImageCodec::Jpeg => "jpeg",
            ImageCodec::Webp => "webp",
            ImageCodec::Gif => "gif",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ImageCodec::Png => "image/png",
            ImageCodec::Jpeg => "image/jpeg",
            ImageCodec::Webp => "image/webp",
            ImageCodec::Gif => "image/gif",
        }
    }
}

/// A form a fragment's bytes can take, either as stored or as rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Representation {
    PlainText,
    Markdown,
    Html,
    Json,
    Image(ImageCodec),
}

impl Representation {
    /// Every representation the registry knows about.
    pub const ALL: [Representation; 8] = [
        Representation::PlainText,
        Representation::Markdown,
        Representation::Html,
        Representation::Json,
        Representation::Image(ImageCodec::Png),
        Representation::Image(ImageCodec::Jpeg),
        Representation::Image(ImageCodec::Webp),
        Representation::Image(ImageCodec::Gif),
    ];

    /// Classify a content type. Parameters such as `charset` are ignored.
    pub fn from_mime(content_type: &str) -> Option<Self> {
        let base = base_type(content_type);
        Self::ALL
            .into_iter()
            .find(|r| r.mime().eq_ignore_ascii_case(base))
    }

    /// Look up a representation by subtype name (`plain`, `html`, `jpeg`, ...).
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.subtype().eq_ignore_ascii_case(subtype))
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Representation::PlainText => "text/plain",
            Representation::Markdown => "text/markdown",
            Representation::Html => "text/html",
            Representation::Json => "application/json",
            Representation::Image(codec) => codec.mime(),
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            Representation::PlainText => "plain",
            Representation::Markdown => "markdown",
            Representation::Html => "html",
            Representation::Json => "json",
            Representation::Image(codec) => codec.subtype(),
        }
    }

    /// `text/*` and `application/json` are handled by the text transforms.
    pub fn is_textual(&self) -> bool {
        !matches!(self, Representation::Image(_))
    }

    /// Legal targets for a fragment stored as `self`.
    ///
    /// Markdown can become HTML, HTML cannot become Markdown.
    pub fn targets(&self) -> Vec<Representation> {
        match self {
            Representation::PlainText => vec![Representation::PlainText],
            Representation::Markdown => vec![
                Representation::PlainText,
                Representation::Html,
                Representation::Markdown,
            ],
            Representation::Html => vec![Representation::PlainText, Representation::Html],
            Representation::Json => vec![Representation::Json, Representation::PlainText],
            Representation::Image(_) => ImageCodec::ALL
                .into_iter()
                .map(Representation::Image)
                .collect(),
        }
    }

    pub fn can_become(&self, target: Representation) -> bool {
        self.targets().contains(&target)
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime())
    }
}

/// Strip parameters from a content type: `"text/plain; charset=utf-8"` -> `"text/plain"`.
pub fn base_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// True if `value` is exactly one of [`SUPPORTED_TYPES`].
pub fn is_supported_type(value: &str) -> bool {
    SUPPORTED_TYPES.contains(&value)
}

/// MIME types a fragment of `content_type` may be rendered as.
///
/// Unknown families yield an empty list.
pub fn convertible_formats(content_type: &str) -> Vec<&'static str> {
    Representation::from_mime(content_type)
        .map(|r| r.targets().iter().map(|t| t.mime()).collect())
        .unwrap_or_default()
}

/// Map an extension token onto a subtype name.
///
/// A leading dot is tolerated and matching is case-insensitive. Tokens that
/// are not aliases pass through lowercased.
pub fn resolve_extension(token: &str) -> String {
    let token = token.trim_start_matches('.').to_ascii_lowercase();
    match token.as_str() {
        "txt" => "plain".to_string(),
        "md" => "markdown".to_string(),
        "jpg" => "jpeg".to_string(),
        _ => token,
    }
}
