//! The instruction prompt sent to the vision model.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the field list below is a wire contract
//!    shared with [`crate::model::InvoiceData`]'s serde shape; changing one
//!    without the other breaks extraction silently, so they should be edited
//!    side by side.
//!
//! 2. **Testability** — parsing tests can feed the adapter responses shaped
//!    exactly like what this prompt requests without a live model call.

/// Fixed extraction prompt. Requests a bare JSON object with exactly the
/// fields of [`crate::model::InvoiceData`].
///
/// Models occasionally wrap the object in markdown fences anyway; the
/// adapter strips those before parsing rather than relying on compliance.
pub const EXTRACTION_PROMPT: &str = r#"Extract invoice data from this image and return ONLY a JSON object with these fields:
{
    "date": "YYYY-MM-DD format",
    "supplier": "Company name",
    "amount": 123.45,
    "description": "Brief description of goods/services",
    "currency": "USD"
}

Be precise with the amount and make sure the date is in YYYY-MM-DD format.
Return ONLY the JSON object, no markdown fences, no commentary."#;
