//! Extraction adapter: one page image in, [`InvoiceData`] out — always.
//!
//! The vision model is the pipeline's only external call and its only
//! suspension point. It is also the least reliable stage, so the adapter's
//! contract is deliberately total: [`extract_invoice`] cannot fail. Any
//! problem — provider error, timeout, non-JSON text, missing field — is
//! logged and replaced by the fixed placeholder record. Availability is
//! prioritised over accuracy: a record with placeholder data can be
//! corrected by a human; a rejected upload is just lost work.
//!
//! One attempt, time-bounded, no retry. A stuck provider must not hold a
//! worker, and a flaky one gets the fallback rather than a backoff loop.
//!
//! The model sits behind the [`ExtractionModel`] trait so pipeline runs are
//! testable with a canned implementation; [`VisionModel`] is the production
//! implementation over an `edgequake-llm` provider.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::model::InvoiceData;
use crate::pipeline::encode;
use crate::pipeline::normalize::PageImage;
use crate::prompts::EXTRACTION_PROMPT;

/// Supplier name carried by the placeholder record.
pub const FALLBACK_SUPPLIER: &str = "Auto-detected Supplier";

/// Description carried by the placeholder record.
pub const FALLBACK_DESCRIPTION: &str = "Invoice processing - OpenAI extraction failed";

/// The external vision-capable model, reduced to the one call the pipeline
/// makes: prompt + image → raw response text.
#[async_trait]
pub trait ExtractionModel: Send + Sync {
    async fn complete(&self, prompt: &str, image: ImageData) -> Result<String, PipelineError>;
}

/// Production [`ExtractionModel`] over an `edgequake-llm` vision provider.
pub struct VisionModel {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl VisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl ExtractionModel for VisionModel {
    async fn complete(&self, prompt: &str, image: ImageData) -> Result<String, PipelineError> {
        // A single user turn carrying both the instruction text and the image.
        let messages = vec![ChatMessage::user_with_images(prompt, vec![image])];

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| PipelineError::ModelApi {
                message: e.to_string(),
            })?;

        debug!(
            "Model responded: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        Ok(response.content)
    }
}

/// Extract structured invoice data from a page image.
///
/// Never fails: every error path collapses into [`fallback_invoice`] with
/// the failure logged at `warn`. What counts as a valid response is defined
/// by [`parse_response`].
pub async fn extract_invoice(
    model: &dyn ExtractionModel,
    page: &PageImage,
    time_limit: Duration,
) -> InvoiceData {
    match try_extract(model, page, time_limit).await {
        Ok(data) => {
            debug!(supplier = %data.supplier, amount = %data.amount, "Extraction succeeded");
            data
        }
        Err(e) => {
            warn!("Extraction failed, using placeholder record: {e}");
            fallback_invoice()
        }
    }
}

async fn try_extract(
    model: &dyn ExtractionModel,
    page: &PageImage,
    time_limit: Duration,
) -> Result<InvoiceData, PipelineError> {
    let image = encode::encode_page(page)?;

    let raw = timeout(time_limit, model.complete(EXTRACTION_PROMPT, image))
        .await
        .map_err(|_| PipelineError::ExtractionTimeout {
            secs: time_limit.as_secs(),
        })??;

    parse_response(&raw)
}

/// Parse and validate the model's response text.
///
/// Tolerates markdown fences and stray commentary around the JSON object
/// (models add both despite instructions). Validation is minimal by design:
/// the amount must be a non-negative number; the date is stored as-is.
pub fn parse_response(raw: &str) -> Result<InvoiceData, PipelineError> {
    let body = strip_fences(raw.trim());
    let json = extract_json_object(body)?;

    let data: InvoiceData =
        serde_json::from_str(json).map_err(|e| PipelineError::MalformedResponse {
            detail: e.to_string(),
        })?;

    if data.amount < Decimal::ZERO {
        return Err(PipelineError::MalformedResponse {
            detail: format!("negative amount {}", data.amount),
        });
    }

    Ok(data)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

fn strip_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input) {
        Some(caps) => caps.get(1).map_or(input, |m| m.as_str()),
        None => input,
    }
}

/// Slice out the outermost `{…}` object, discarding any surrounding text.
fn extract_json_object(s: &str) -> Result<&str, PipelineError> {
    let start = s.find('{').ok_or_else(|| PipelineError::MalformedResponse {
        detail: "no JSON object in response".to_string(),
    })?;
    let end = s.rfind('}').ok_or_else(|| PipelineError::MalformedResponse {
        detail: "unterminated JSON object in response".to_string(),
    })?;
    if end <= start {
        return Err(PipelineError::MalformedResponse {
            detail: "malformed JSON object in response".to_string(),
        });
    }
    Ok(&s[start..=end])
}

/// The fixed placeholder record, dated today.
pub fn fallback_invoice() -> InvoiceData {
    fallback_invoice_on(Utc::now().date_naive())
}

/// Placeholder record with an explicit date, for deterministic tests.
pub fn fallback_invoice_on(date: NaiveDate) -> InvoiceData {
    InvoiceData {
        date: date.format("%Y-%m-%d").to_string(),
        supplier: FALLBACK_SUPPLIER.to_string(),
        amount: Decimal::new(100_00, 2),
        description: FALLBACK_DESCRIPTION.to_string(),
        currency: "USD".to_string(),
    }
}
