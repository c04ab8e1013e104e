//! Request building: pair a rendered page with the run's instruction text.
//!
//! The page is PNG-encoded and base64-wrapped once here; every provider
//! adapter embeds the same payload in its own request shape. PNG is lossless,
//! which matters for Fraktur and handwriting where JPEG artefacts blur the
//! strokes a model needs to tell letters apart.

use crate::pipeline::render::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// A base64 image blob with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub base64: String,
}

/// One page's request, consumed once by a [`crate::pipeline::llm::ModelClient`].
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Identifier of the owning document, for logging.
    pub document: String,
    /// 1-based page index, for logging.
    pub page: usize,
    /// Instruction text shared by every request of the run.
    pub instruction: Arc<str>,
    pub image: EncodedImage,
}

/// Encode a rendered page as base64 PNG.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(EncodedImage {
        mime_type: "image/png",
        base64: b64,
    })
}

/// Build the request for one page.
pub fn build_request(
    page: &PageImage,
    instruction: &Arc<str>,
) -> Result<ModelRequest, image::ImageError> {
    Ok(ModelRequest {
        document: page.document.clone(),
        page: page.index,
        instruction: Arc::clone(instruction),
        image: encode_page(&page.image)?,
    })
}
