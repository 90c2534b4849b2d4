//! Domain types for the invoice-to-ledger pipeline.
//!
//! Everything that crosses a stage boundary or lands in the document store
//! lives here. Monetary amounts are [`rust_decimal::Decimal`] — never
//! floating point — so the debit/credit balance invariant survives
//! serialisation round-trips exactly.
//!
//! The aggregate root is [`InvoiceRecord`]; it is only ever constructed by
//! the assembler (see [`crate::pipeline::assemble`]), which is what keeps the
//! "exactly one debit and one credit, both equal to the invoice amount"
//! invariant out of reach of ad-hoc construction in the rest of the crate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::PipelineError;

/// Structured data extracted from one invoice image.
///
/// Produced once per invoice — either parsed from the vision model's JSON
/// response or synthesised by the fallback path — and immutable thereafter.
///
/// `date` is ISO-formatted text by contract with the model prompt, but is
/// deliberately *not* validated: a slightly off-format date from the model is
/// still more useful than a discarded extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceData {
    /// Invoice date as stated on the document (`YYYY-MM-DD` by contract).
    pub date: String,
    /// Supplier / vendor name.
    pub supplier: String,
    /// Total payable amount. Non-negative.
    pub amount: Decimal,
    /// Brief description of the goods or services.
    pub description: String,
    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Which side of a double-entry record a [`LedgerEntry`] represents.
///
/// The lowercase serde form is also the form that enters the verification
/// hash, so renaming a variant would invalidate every previously sealed
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "debit"),
            Self::Credit => write!(f, "credit"),
        }
    }
}

/// One side (debit or credit) of the double-entry record for an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Classified account name, e.g. "Office Expenses" or "Accounts Payable".
    pub account: String,
    /// Full invoice amount — entries are never split.
    pub amount: Decimal,
    pub invoice_id: Uuid,
    /// Copied from [`InvoiceData::date`] — the invoice's stated date, not the
    /// upload instant.
    pub date: String,
}

/// Status carried by every [`VerifiedTransaction`].
pub const VERIFIED: &str = "verified";

/// Immutable tamper-evidence anchor for an invoice's ledger entries.
///
/// The hash seals the entries *at the moment of creation* — it embeds the
/// creation timestamp, so it authenticates "these exact entries were sealed
/// at this exact instant" rather than being a content address. The sealed
/// timestamp is persisted here verbatim, which is what makes the digest
/// recomputable from the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedTransaction {
    pub id: Uuid,
    /// Lowercase hex SHA-256 digest, 64 characters.
    pub hash: String,
    /// Creation instant captured when the seal was computed.
    pub timestamp: DateTime<Utc>,
    pub invoice_id: Uuid,
    /// Always [`VERIFIED`].
    pub status: String,
}

/// Caller-supplied sustainability metrics, pre-validation.
///
/// Unspecified fields take the documented defaults; see
/// [`ImpactEntry::from_metrics`] for the validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactMetrics {
    /// Liters.
    pub water_usage: f64,
    /// Tons.
    pub co2_emissions: f64,
    /// 1–10.
    pub labor_score: u8,
    /// Percentage, 0–100.
    pub recycling_rate: f64,
}

impl Default for ImpactMetrics {
    fn default() -> Self {
        Self {
            water_usage: 0.0,
            co2_emissions: 0.0,
            labor_score: 5,
            recycling_rate: 0.0,
        }
    }
}

/// Validated sustainability metrics attached to an invoice post hoc.
///
/// Zero or one per invoice; attaching again replaces the previous entry
/// wholesale — there is no field-level merge and no history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEntry {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub water_usage: f64,
    pub co2_emissions: f64,
    pub labor_score: u8,
    pub recycling_rate: f64,
}

impl ImpactEntry {
    /// Validate raw metrics into an entry with a fresh id.
    ///
    /// # Errors
    /// [`PipelineError::InvalidImpact`] if water/CO₂ are negative, the labor
    /// score is outside 1–10, or the recycling rate is outside 0–100.
    pub fn from_metrics(invoice_id: Uuid, metrics: ImpactMetrics) -> Result<Self, PipelineError> {
        if metrics.water_usage < 0.0 {
            return Err(PipelineError::InvalidImpact {
                detail: format!("water_usage must be >= 0, got {}", metrics.water_usage),
            });
        }
        if metrics.co2_emissions < 0.0 {
            return Err(PipelineError::InvalidImpact {
                detail: format!("co2_emissions must be >= 0, got {}", metrics.co2_emissions),
            });
        }
        if !(1..=10).contains(&metrics.labor_score) {
            return Err(PipelineError::InvalidImpact {
                detail: format!("labor_score must be 1-10, got {}", metrics.labor_score),
            });
        }
        if !(0.0..=100.0).contains(&metrics.recycling_rate) {
            return Err(PipelineError::InvalidImpact {
                detail: format!(
                    "recycling_rate must be 0-100, got {}",
                    metrics.recycling_rate
                ),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            invoice_id,
            water_usage: metrics.water_usage,
            co2_emissions: metrics.co2_emissions,
            labor_score: metrics.labor_score,
            recycling_rate: metrics.recycling_rate,
        })
    }
}

/// The complete persisted record for one processed invoice.
///
/// Constructed exclusively by [`crate::pipeline::assemble::assemble`]; once
/// persisted, the only permitted mutation is replacing `impact_entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub data: InvoiceData,
    /// Exactly two entries: one debit, then one credit.
    pub ledger_entries: Vec<LedgerEntry>,
    pub verified_transaction: VerifiedTransaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_entry: Option<ImpactEntry>,
    /// Original upload bytes, base64-encoded for storage and replay.
    pub file_content: String,
}

impl InvoiceRecord {
    /// Sum of all debit-side entries.
    pub fn debit_total(&self) -> Decimal {
        self.side_total(EntryType::Debit)
    }

    /// Sum of all credit-side entries.
    pub fn credit_total(&self) -> Decimal {
        self.side_total(EntryType::Credit)
    }

    fn side_total(&self, side: EntryType) -> Decimal {
        self.ledger_entries
            .iter()
            .filter(|e| e.entry_type == side)
            .map(|e| e.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn entry_type_display_matches_serde() {
        assert_eq!(EntryType::Debit.to_string(), "debit");
        assert_eq!(EntryType::Credit.to_string(), "credit");
        assert_eq!(
            serde_json::to_string(&EntryType::Debit).unwrap(),
            "\"debit\""
        );
        assert_eq!(
            serde_json::to_string(&EntryType::Credit).unwrap(),
            "\"credit\""
        );
    }

    #[test]
    fn invoice_data_currency_defaults_to_usd() {
        let data: InvoiceData = serde_json::from_str(
            r#"{"date":"2025-02-15","supplier":"Acme","amount":12.5,"description":"paper"}"#,
        )
        .unwrap();
        assert_eq!(data.currency, "USD");
        assert_eq!(data.amount, dec!(12.5));
    }

    #[test]
    fn invoice_data_amount_accepts_json_number() {
        let data: InvoiceData = serde_json::from_str(
            r#"{"date":"2025-02-15","supplier":"Acme","amount":123.45,"description":"x","currency":"EUR"}"#,
        )
        .unwrap();
        assert_eq!(data.amount, dec!(123.45));
        assert_eq!(data.amount.to_string(), "123.45");
    }

    #[test]
    fn impact_metrics_defaults() {
        let m = ImpactMetrics::default();
        assert_eq!(m.labor_score, 5);
        assert_eq!(m.water_usage, 0.0);
        assert_eq!(m.co2_emissions, 0.0);
        assert_eq!(m.recycling_rate, 0.0);
    }

    #[test]
    fn impact_entry_validates_labor_score() {
        let invoice_id = Uuid::new_v4();
        let bad = ImpactMetrics {
            labor_score: 0,
            ..Default::default()
        };
        assert!(ImpactEntry::from_metrics(invoice_id, bad).is_err());

        let bad = ImpactMetrics {
            labor_score: 11,
            ..Default::default()
        };
        assert!(ImpactEntry::from_metrics(invoice_id, bad).is_err());

        let ok = ImpactEntry::from_metrics(invoice_id, ImpactMetrics::default()).unwrap();
        assert_eq!(ok.invoice_id, invoice_id);
        assert_eq!(ok.labor_score, 5);
    }

    #[test]
    fn impact_entry_rejects_negative_metrics() {
        let invoice_id = Uuid::new_v4();
        let bad = ImpactMetrics {
            water_usage: -1.0,
            ..Default::default()
        };
        assert!(ImpactEntry::from_metrics(invoice_id, bad).is_err());

        let bad = ImpactMetrics {
            co2_emissions: -0.1,
            ..Default::default()
        };
        assert!(ImpactEntry::from_metrics(invoice_id, bad).is_err());

        let bad = ImpactMetrics {
            recycling_rate: 101.0,
            ..Default::default()
        };
        assert!(ImpactEntry::from_metrics(invoice_id, bad).is_err());
    }

    #[test]
    fn ledger_entry_serde_uses_type_key() {
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Debit,
            account: "Office Expenses".to_string(),
            amount: dec!(10),
            invoice_id: Uuid::new_v4(),
            date: "2025-02-15".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"type\":\"debit\""), "got: {json}");
    }
}
