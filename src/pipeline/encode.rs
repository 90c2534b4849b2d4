//! Image encoding: [`PageImage`] → base64 [`ImageData`] for the model request.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. Rasterised PDF pages are JPEG-encoded — invoices are photographs of
//! paper, and JPEG keeps the request body an order of magnitude smaller than
//! PNG at no measurable extraction cost. Raster uploads keep their original
//! bytes and declared MIME type; re-encoding them would only lose fidelity.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use std::io::Cursor;
use tracing::debug;

use crate::error::PipelineError;
use crate::pipeline::normalize::PageImage;

/// Encode one page as base64 image data ready for the model API.
///
/// `detail: "high"` instructs GPT-4-class models to spend their full image
/// tile budget; without it, fine print and totals columns get lost.
pub fn encode_page(page: &PageImage) -> Result<ImageData, PipelineError> {
    match page {
        PageImage::Rendered(img) => {
            // pdfium bitmaps carry an alpha channel; JPEG has none.
            let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

            let mut buf = Vec::new();
            rgb.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Jpeg)
                .map_err(|e| PipelineError::ImageEncode {
                    detail: e.to_string(),
                })?;

            let b64 = STANDARD.encode(&buf);
            debug!("Encoded rendered page → {} bytes base64", b64.len());

            Ok(ImageData::new(b64, "image/jpeg").with_detail("high"))
        }
        PageImage::Raster { bytes, media_type } => {
            let b64 = STANDARD.encode(bytes);
            debug!(
                "Encoded {} passthrough → {} bytes base64",
                media_type.mime(),
                b64.len()
            );

            Ok(ImageData::new(b64, media_type.mime()).with_detail("high"))
        }
    }
}
