//! Top-level pipeline entry points.
//!
//! One invoice upload is one independent unit of work: normalisation,
//! extraction, classification, and sealing for one invoice never touch
//! another run's state. The only shared resource is the document store, and
//! the pipeline gives it exactly one atomic write per call.
//!
//! Extraction is fallback-protected (see [`crate::pipeline::extract`]), so
//! the failure surface of these functions is the normaliser, provider
//! resolution, and the store: an upload either yields a complete record or
//! fails with no partial record created.

use std::sync::Arc;
use std::time::Instant;

use edgequake_llm::ProviderFactory;
use tokio::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::{ImpactEntry, ImpactMetrics, InvoiceRecord};
use crate::pipeline::extract::{self, ExtractionModel, VisionModel};
use crate::pipeline::normalize::{self, MediaType};
use crate::pipeline::assemble;
use crate::store::DocumentStore;

/// Model used when a provider is configured without an explicit model id.
const DEFAULT_MODEL: &str = "gpt-4o";

/// Run the full derivation pipeline for one uploaded invoice.
///
/// The caller has already validated the media type (boundary responsibility);
/// the pipeline assumes supported input.
///
/// # Errors
/// Fatal only: unreadable/empty document, or no extraction provider could be
/// resolved. Extraction failures do *not* error — they produce the
/// placeholder record.
pub async fn process_invoice(
    bytes: &[u8],
    media_type: MediaType,
    filename: &str,
    config: &PipelineConfig,
) -> Result<InvoiceRecord, PipelineError> {
    let total_start = Instant::now();
    info!("Processing invoice: {}", filename);

    // ── Step 1: Resolve the extraction model ─────────────────────────────
    let model = resolve_model(config)?;

    // ── Step 2: Normalise to page images ─────────────────────────────────
    let pages = normalize::normalize(bytes, media_type).await?;
    if pages.len() > 1 {
        // Single-page invoices only: later pages are rendered but not read.
        debug!("Document has {} pages; extracting from the first", pages.len());
    }

    // ── Step 3: Extract structured data (fallback-protected) ─────────────
    let data = extract::extract_invoice(
        model.as_ref(),
        &pages[0],
        Duration::from_secs(config.api_timeout_secs),
    )
    .await;

    // ── Step 4: Assemble the record ──────────────────────────────────────
    let record = assemble::assemble(filename, bytes, data);

    info!(
        "Invoice {} processed in {}ms",
        record.id,
        total_start.elapsed().as_millis()
    );

    Ok(record)
}

/// [`process_invoice`] plus a single atomic insert into the store.
pub async fn process_and_store(
    bytes: &[u8],
    media_type: MediaType,
    filename: &str,
    config: &PipelineConfig,
    store: &dyn DocumentStore,
) -> Result<InvoiceRecord, PipelineError> {
    let record = process_invoice(bytes, media_type, filename, config).await?;
    store.insert(&record).await?;
    info!("Invoice {} persisted", record.id);
    Ok(record)
}

/// Validate and attach sustainability metrics to a stored invoice.
///
/// Wholesale replace: a previous impact entry is discarded, and unspecified
/// metrics take their defaults.
///
/// # Errors
/// [`PipelineError::InvalidImpact`] on out-of-range metrics,
/// [`PipelineError::InvoiceNotFound`] when the id matches nothing.
pub async fn attach_impact(
    store: &dyn DocumentStore,
    invoice_id: Uuid,
    metrics: ImpactMetrics,
) -> Result<ImpactEntry, PipelineError> {
    let impact = ImpactEntry::from_metrics(invoice_id, metrics)?;

    if store.set_impact(invoice_id, impact.clone()).await? {
        info!("Impact entry attached to invoice {}", invoice_id);
        Ok(impact)
    } else {
        Err(PipelineError::InvoiceNotFound {
            id: invoice_id.to_string(),
        })
    }
}

/// Resolve the extraction model, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.model_client`) — used as-is; this is the
///    substitution point for tests and custom middleware.
/// 2. **Named provider** (`config.provider_name`) — instantiated via
///    [`ProviderFactory`], which reads the matching API key from the
///    environment.
/// 3. **`OPENAI_API_KEY` present** — defaults to OpenAI so users holding
///    several provider keys get a predictable choice.
/// 4. **Full auto-detection** — the factory scans all known API key
///    variables and picks the first available provider.
fn resolve_model(config: &PipelineConfig) -> Result<Arc<dyn ExtractionModel>, PipelineError> {
    if let Some(ref client) = config.model_client {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_vision_model(name, model, config);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_vision_model("openai", model, config);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PipelineError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No extraction provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(VisionModel::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}

/// Instantiate a named provider wrapped as an [`ExtractionModel`].
fn create_vision_model(
    provider_name: &str,
    model: &str,
    config: &PipelineConfig,
) -> Result<Arc<dyn ExtractionModel>, PipelineError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PipelineError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;

    Ok(Arc::new(VisionModel::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}
