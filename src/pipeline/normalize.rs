//! Document normalisation: uploaded bytes → ordered page images.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking thread pool
//! so rasterisation never stalls a Tokio worker thread.
//!
//! ## Why a fixed 200 DPI?
//!
//! The rendered page is the extraction model's entire view of the invoice.
//! Rendering at a fixed DPI derived from the page's physical size — rather
//! than a pixel cap — makes the model input reproducible across uploads of
//! the same document, which is what makes extraction quality comparable over
//! time. 200 DPI keeps small print legible without blowing up upload size.

use crate::error::PipelineError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::io::Write;
use tracing::{debug, info};

/// Rendering resolution for PDF pages, in dots per inch.
pub const RENDER_DPI: u32 = 200;

/// Media types accepted at the caller boundary.
///
/// Anything else must be rejected *before* the pipeline runs — the
/// normaliser itself assumes supported input (rejection is the boundary's
/// job, see [`MediaType::from_mime`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
}

impl MediaType {
    /// Parse a declared MIME type.
    ///
    /// # Errors
    /// [`PipelineError::UnsupportedMediaType`] for anything but PDF/JPEG/PNG.
    pub fn from_mime(mime: &str) -> Result<Self, PipelineError> {
        match mime.to_ascii_lowercase().as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            other => Err(PipelineError::UnsupportedMediaType {
                mime: other.to_string(),
            }),
        }
    }

    /// Guess from a filename extension. Used by the CLI boundary.
    pub fn from_filename(filename: &str) -> Result<Self, PipelineError> {
        let ext = filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(PipelineError::UnsupportedMediaType {
                mime: format!("file extension '.{ext}'"),
            }),
        }
    }

    /// The canonical MIME type string.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

/// A single renderable page produced by normalisation.
///
/// Raster uploads are passed through untouched — there is nothing to gain
/// from decoding and re-encoding an image the model can already consume, and
/// re-encoding would cost fidelity on JPEG input.
pub enum PageImage {
    /// A PDF page rasterised at [`RENDER_DPI`].
    Rendered(DynamicImage),
    /// The original raster upload, unchanged.
    Raster {
        bytes: Vec<u8>,
        media_type: MediaType,
    },
}

/// Normalise uploaded bytes into at least one page image, in document order.
///
/// Raster input yields exactly one passthrough page. PDF input yields one
/// rendered page per document page.
///
/// # Errors
/// Malformed PDFs are fatal ([`PipelineError::CorruptPdf`]) — there is no
/// recovery for a document the rasteriser cannot read. A PDF with zero pages
/// is [`PipelineError::EmptyDocument`].
pub async fn normalize(
    bytes: &[u8],
    media_type: MediaType,
) -> Result<Vec<PageImage>, PipelineError> {
    match media_type {
        MediaType::Pdf => render_pdf(bytes).await,
        MediaType::Jpeg | MediaType::Png => Ok(vec![PageImage::Raster {
            bytes: bytes.to_vec(),
            media_type,
        }]),
    }
}

/// Rasterise every page of a PDF, in order, inside `spawn_blocking`.
async fn render_pdf(bytes: &[u8]) -> Result<Vec<PageImage>, PipelineError> {
    let bytes = bytes.to_vec();
    tokio::task::spawn_blocking(move || render_pdf_blocking(&bytes))
        .await
        .map_err(|e| PipelineError::Internal(format!("Render task panicked: {e}")))?
}

/// Blocking implementation of PDF rasterisation.
fn render_pdf_blocking(bytes: &[u8]) -> Result<Vec<PageImage>, PipelineError> {
    // pdfium wants a filesystem path; the temp file is cleaned up on return.
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| PipelineError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PipelineError::Internal(format!("tempfile write: {e}")))?;

    let pdfium = Pdfium::default();
    let document = pdfium
        .load_pdf_from_file(tmp.path(), None)
        .map_err(|e| PipelineError::CorruptPdf {
            detail: format!("{e:?}"),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    if total == 0 {
        return Err(PipelineError::EmptyDocument);
    }
    info!("PDF loaded: {} pages", total);

    let mut results = Vec::with_capacity(total);

    for idx in 0..total {
        let page = pages
            .get(idx as u16)
            .map_err(|e| PipelineError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            })?;

        // Page dimensions come back in points (72/inch); scale to RENDER_DPI.
        let width_px = (page.width().value * RENDER_DPI as f32 / 72.0).round() as i32;
        let height_px = (page.height().value * RENDER_DPI as f32 / 72.0).round() as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_maximum_height(height_px);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PipelineError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{e:?}"),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        results.push(PageImage::Rendered(image));
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_from_mime() {
        assert_eq!(MediaType::from_mime("application/pdf").unwrap(), MediaType::Pdf);
        assert_eq!(MediaType::from_mime("image/jpeg").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_mime("image/jpg").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_mime("IMAGE/PNG").unwrap(), MediaType::Png);
        assert!(MediaType::from_mime("text/html").is_err());
        assert!(MediaType::from_mime("").is_err());
    }

    #[test]
    fn media_type_from_filename() {
        assert_eq!(MediaType::from_filename("inv.pdf").unwrap(), MediaType::Pdf);
        assert_eq!(MediaType::from_filename("scan.JPG").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_filename("scan.jpeg").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_filename("scan.png").unwrap(), MediaType::Png);
        assert!(MediaType::from_filename("notes.txt").is_err());
        assert!(MediaType::from_filename("no_extension").is_err());
    }

    #[tokio::test]
    async fn raster_input_passes_through_unchanged() {
        let bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4];
        let pages = normalize(&bytes, MediaType::Png).await.unwrap();
        assert_eq!(pages.len(), 1);
        match &pages[0] {
            PageImage::Raster {
                bytes: out,
                media_type,
            } => {
                assert_eq!(out, &bytes);
                assert_eq!(*media_type, MediaType::Png);
            }
            PageImage::Rendered(_) => panic!("raster input must not be re-rendered"),
        }
    }

    // PDF rasterisation needs the pdfium native library; exercised by the
    // env-gated integration test in tests/pipeline.rs.
}
