//! Error types for the invoice2ledger library.
//!
//! One enum covers the whole pipeline, but its variants fall into two very
//! different regimes:
//!
//! * **Fatal** — the run cannot produce a record at all (unreadable PDF,
//!   unsupported media type at the caller boundary, store failure). Returned
//!   as `Err(PipelineError)` from the top-level `process_*` functions.
//!
//! * **Absorbed** — extraction-side failures ([`PipelineError::ModelApi`],
//!   [`PipelineError::ExtractionTimeout`], [`PipelineError::MalformedResponse`])
//!   exist so the adapter can log *why* extraction failed, but they never
//!   cross the adapter boundary: the fallback record replaces them and the
//!   run continues.
//!
//! There is deliberately no "partial record" error: an upload either yields a
//! complete [`crate::model::InvoiceRecord`] or nothing.

use thiserror::Error;

/// All errors produced by the invoice2ledger library.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors (caller boundary) ───────────────────────────────────
    /// Declared media type is none of PDF, JPEG, PNG.
    #[error("Unsupported media type '{mime}'. Upload a PDF, JPEG, or PNG file.")]
    UnsupportedMediaType { mime: String },

    /// The document parsed but contains no renderable pages.
    #[error("Document has no pages")]
    EmptyDocument,

    // ── Normalisation errors (fatal — no recovery for an unrenderable doc) ──
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Re-encoding a page image for the model request failed.
    #[error("Image encoding failed: {detail}")]
    ImageEncode { detail: String },

    // ── Extraction errors (absorbed by the adapter fallback) ─────────────
    /// The configured model provider is not initialised (missing API key etc.).
    #[error("Extraction model provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The model API returned an error.
    #[error("Extraction model error: {message}")]
    ModelApi { message: String },

    /// The model call exceeded the configured time bound. Single attempt, no
    /// retry — the fallback record takes over.
    #[error("Extraction model call timed out after {secs}s")]
    ExtractionTimeout { secs: u64 },

    /// The model's response could not be parsed into invoice data.
    #[error("Extraction response is not valid invoice JSON: {detail}")]
    MalformedResponse { detail: String },

    // ── Store / attachment errors ────────────────────────────────────────
    /// Exact-key lookup found no invoice.
    #[error("Invoice not found: {id}")]
    InvoiceNotFound { id: String },

    /// Impact metrics failed validation.
    #[error("Invalid impact metrics: {detail}")]
    InvalidImpact { detail: String },

    /// The document store reported a failure.
    #[error("Document store error: {detail}")]
    Store { detail: String },

    // ── Config errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_display() {
        let e = PipelineError::UnsupportedMediaType {
            mime: "text/html".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("text/html"), "got: {msg}");
        assert!(msg.contains("PDF"));
    }

    #[test]
    fn timeout_display() {
        let e = PipelineError::ExtractionTimeout { secs: 60 };
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn invoice_not_found_display() {
        let e = PipelineError::InvoiceNotFound { id: "7b2a".into() };
        assert!(e.to_string().contains("7b2a"));
    }

    #[test]
    fn corrupt_pdf_display() {
        let e = PipelineError::CorruptPdf {
            detail: "bad xref".into(),
        };
        assert!(e.to_string().contains("bad xref"));
    }
}
