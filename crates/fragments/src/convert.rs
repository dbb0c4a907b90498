//! Conversion engine: render a fragment's stored bytes as a requested
//! representation, or refuse.
//!
//! The engine is stateless. A request resolves in three steps:
//!
//! 1. No extension: the stored bytes and type come back untouched.
//! 2. The extension names the fragment's own subtype: same as 1, no re-encode.
//! 3. Otherwise the target must be legal for the source family
//!    ([`Representation::targets`]) and is produced by [`transform`].
//!
//! Refusals are `UnsupportedConversion`; a transform that was attempted and
//! broke is `ConversionFailed`.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use pulldown_cmark::{html, Options, Parser};
use tracing::{debug, instrument};

use crate::error::{FragmentError, FragmentResult};
use crate::fragment::Fragment;
use crate::gateway::StorageGateway;
use crate::registry::{resolve_extension, ImageCodec, Representation};

/// Bytes produced for a read, with the type to report alongside them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// What a read should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The stored bytes and type, verbatim.
    Original,
    /// A converted representation.
    Convert(Representation),
}

/// Decide what a request for `extension` on a fragment of `content_type` yields.
pub fn resolve_target(content_type: &str, extension: Option<&str>) -> FragmentResult<Target> {
    let Some(extension) = extension else {
        return Ok(Target::Original);
    };
    let subtype = resolve_extension(extension);

    let refuse = || FragmentError::UnsupportedConversion {
        from: content_type.to_string(),
        to: subtype.clone(),
    };
    let source = Representation::from_mime(content_type).ok_or_else(refuse)?;

    if subtype == source.subtype() {
        return Ok(Target::Original);
    }

    Representation::from_subtype(&subtype)
        .filter(|target| source.can_become(*target))
        .map(Target::Convert)
        .ok_or_else(refuse)
}

/// Render stored `data` of `content_type` for `extension`, synchronously.
pub fn convert(content_type: &str, data: Vec<u8>, extension: Option<&str>) -> FragmentResult<Rendered> {
    match resolve_target(content_type, extension)? {
        Target::Original => Ok(Rendered {
            data,
            content_type: content_type.to_string(),
        }),
        Target::Convert(target) => {
            let source = Representation::from_mime(content_type).ok_or_else(|| {
                FragmentError::UnsupportedConversion {
                    from: content_type.to_string(),
                    to: target.subtype().to_string(),
                }
            })?;
            Ok(Rendered {
                data: transform(source, target, &data)?,
                content_type: target.mime().to_string(),
            })
        }
    }
}

/// Load a fragment's data and render it for `extension`.
///
/// Legality is decided before any data is read. Image re-encoding runs on the
/// blocking pool.
#[instrument(skip(gateway, fragment), fields(id = %fragment.id(), content_type = %fragment.content_type()))]
pub async fn render<G>(gateway: &G, fragment: &Fragment, extension: Option<&str>) -> FragmentResult<Rendered>
where
    G: StorageGateway + ?Sized,
{
    let target = resolve_target(fragment.content_type(), extension)?;
    let data = fragment.read_data(gateway).await?;

    let target = match target {
        Target::Original => {
            return Ok(Rendered {
                data,
                content_type: fragment.content_type().to_string(),
            })
        }
        Target::Convert(target) => target,
    };

    let source = fragment.representation();
    debug!(%source, %target, "converting fragment");
    let data = match target {
        Representation::Image(_) => tokio::task::spawn_blocking(move || transform(source, target, &data))
            .await
            .map_err(|e| FragmentError::Io(format!("conversion task failed: {}", e)))??,
        _ => transform(source, target, &data)?,
    };

    Ok(Rendered {
        data,
        content_type: target.mime().to_string(),
    })
}

/// Produce `target` from `data` stored as `source`.
///
/// Only pairs allowed by the legality matrix have a transform; anything else
/// is refused.
pub fn transform(source: Representation, target: Representation, data: &[u8]) -> FragmentResult<Vec<u8>> {
    match (source, target) {
        (Representation::Json, Representation::PlainText) => canonical_json(data),
        (Representation::Markdown, Representation::Html) => markdown_to_html(data),
        (source, Representation::PlainText) if source.is_textual() => Ok(data.to_vec()),
        (Representation::Image(from), Representation::Image(to)) => reencode(from, to, data),
        (source, target) if source == target => Ok(data.to_vec()),
        (source, target) => Err(FragmentError::UnsupportedConversion {
            from: source.mime().to_string(),
            to: target.subtype().to_string(),
        }),
    }
}

fn canonical_json(data: &[u8]) -> FragmentResult<Vec<u8>> {
    let value: serde_json::Value = serde_json::from_slice(data)
        .map_err(|e| FragmentError::ConversionFailed(format!("malformed JSON: {}", e)))?;
    serde_json::to_vec(&value).map_err(|e| FragmentError::ConversionFailed(e.to_string()))
}

fn markdown_to_html(data: &[u8]) -> FragmentResult<Vec<u8>> {
    let text = std::str::from_utf8(data)
        .map_err(|e| FragmentError::ConversionFailed(format!("markdown is not UTF-8: {}", e)))?;

    let parser = Parser::new_ext(text, Options::empty());
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    Ok(out.into_bytes())
}

fn image_format(codec: ImageCodec) -> ImageFormat {
    match codec {
        ImageCodec::Png => ImageFormat::Png,
        ImageCodec::Jpeg => ImageFormat::Jpeg,
        ImageCodec::Webp => ImageFormat::WebP,
        ImageCodec::Gif => ImageFormat::Gif,
    }
}

fn reencode(from: ImageCodec, to: ImageCodec, data: &[u8]) -> FragmentResult<Vec<u8>> {
    let decoded = image::load_from_memory_with_format(data, image_format(from))
        .map_err(|e| FragmentError::ConversionFailed(format!("decoding {}: {}", from.mime(), e)))?;

    // JPEG has no alpha channel.
    let pixels = match to {
        ImageCodec::Jpeg => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => DynamicImage::ImageRgba8(decoded.to_rgba8()),
    };

    let mut out = Cursor::new(Vec::new());
    pixels
        .write_to(&mut out, image_format(to))
        .map_err(|e| FragmentError::ConversionFailed(format!("encoding {}: {}", to.mime(), e)))?;
    Ok(out.into_inner())
}
