//! # invoice2ledger
//!
//! Turn scanned or photographed invoices into balanced double-entry ledger
//! records using Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Invoice OCR pipelines built on plain text extraction fall apart on the
//! documents that matter — photographed receipts, scanned faxes, vendor PDFs
//! with exotic layouts. Instead this crate rasterises the document and lets
//! a VLM read it as a bookkeeper would, then derives the accounting
//! artefacts deterministically: a classified debit/credit pair and a
//! creation-time SHA-256 seal over the transaction.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF / JPEG / PNG)
//!  │
//!  ├─ 1. Normalize  rasterise PDF pages at 200 DPI via pdfium (spawn_blocking),
//!  │                or pass raster uploads through untouched
//!  ├─ 2. Encode     first page → base64 image payload
//!  ├─ 3. Extract    one time-bounded VLM call → {date, supplier, amount, …};
//!  │                any failure becomes the fixed placeholder record
//!  ├─ 4. Classify   description keywords → expense account; emit the
//!  │                balanced debit/credit pair
//!  ├─ 5. Verify     SHA-256 seal over id + timestamp + entries
//!  └─ 6. Assemble   one complete InvoiceRecord → document store
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use invoice2ledger::{process_and_store, MediaType, MemoryStore, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = PipelineConfig::default();
//!     let store = MemoryStore::new();
//!
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let record =
//!         process_and_store(&bytes, MediaType::Pdf, "invoice.pdf", &config, &store).await?;
//!
//!     println!("{} → {}", record.data.supplier, record.verified_transaction.hash);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `inv2ledger` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! invoice2ledger = { version = "0.1", default-features = false }
//! ```
//!
//! ## Guarantees
//!
//! * Every record carries exactly one debit and one credit entry, both equal
//!   to the invoice amount — enforced structurally by the assembler.
//! * Extraction never fails the run: model errors, timeouts, and unparsable
//!   responses all collapse into a fixed, documented placeholder record.
//! * The verification hash seals the entries at creation time; the sealed
//!   timestamp is persisted, so the digest is recomputable from the stored
//!   record (but is deliberately not a content address).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod process;
pub mod prompts;
pub mod reports;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::PipelineError;
pub use model::{
    EntryType, ImpactEntry, ImpactMetrics, InvoiceData, InvoiceRecord, LedgerEntry,
    VerifiedTransaction,
};
pub use pipeline::extract::{ExtractionModel, VisionModel};
pub use pipeline::normalize::MediaType;
pub use process::{attach_impact, process_and_store, process_invoice};
pub use store::{DocumentStore, MemoryStore};
