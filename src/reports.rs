//! Read models over the document store.
//!
//! Cross-record listings and dashboard totals. These are boundary-layer
//! conveniences, not pipeline stages: each one is a pure fold over
//! [`DocumentStore::list`], relying on nothing beyond the full-collection
//! scan the store contract already guarantees. Entries and transactions are
//! annotated with their invoice's supplier (and amount where useful) so
//! consumers don't need a second lookup per row.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PipelineError;
use crate::model::{ImpactEntry, InvoiceRecord, LedgerEntry, VerifiedTransaction};
use crate::store::DocumentStore;

/// How many records [`dashboard_summary`] reports as recent.
const RECENT_LIMIT: usize = 10;

/// A ledger entry annotated with its invoice's supplier.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerLine {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    pub supplier: String,
}

/// A verification record annotated with supplier and invoice amount.
#[derive(Debug, Clone, Serialize)]
pub struct SealedTransactionLine {
    #[serde(flatten)]
    pub transaction: VerifiedTransaction,
    pub supplier: String,
    pub amount: Decimal,
}

/// An impact entry annotated with supplier and invoice amount.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactLine {
    #[serde(flatten)]
    pub impact: ImpactEntry,
    pub supplier: String,
    pub amount: Decimal,
}

/// Collection-wide totals plus the most recent uploads.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub total_invoices: usize,
    pub total_amount: Decimal,
    pub verified_transactions: usize,
    pub impact_entries: usize,
    pub total_co2_emissions: f64,
    /// Mean labor score across invoices carrying an impact entry, rounded to
    /// one decimal. Zero when no impact entries exist.
    pub avg_labor_score: f64,
    /// Up to [`RECENT_LIMIT`] records, newest upload first.
    pub recent_invoices: Vec<InvoiceRecord>,
}

/// Every ledger entry across all invoices.
pub async fn ledger_lines(store: &dyn DocumentStore) -> Result<Vec<LedgerLine>, PipelineError> {
    let records = store.list().await?;
    Ok(records
        .into_iter()
        .flat_map(|record| {
            let supplier = record.data.supplier.clone();
            record
                .ledger_entries
                .into_iter()
                .map(move |entry| LedgerLine {
                    entry,
                    supplier: supplier.clone(),
                })
        })
        .collect())
}

/// Every verification record across all invoices.
pub async fn sealed_transactions(
    store: &dyn DocumentStore,
) -> Result<Vec<SealedTransactionLine>, PipelineError> {
    let records = store.list().await?;
    Ok(records
        .into_iter()
        .map(|record| SealedTransactionLine {
            transaction: record.verified_transaction,
            supplier: record.data.supplier,
            amount: record.data.amount,
        })
        .collect())
}

/// Every attached impact entry across all invoices.
pub async fn impact_lines(store: &dyn DocumentStore) -> Result<Vec<ImpactLine>, PipelineError> {
    let records = store.list().await?;
    Ok(records
        .into_iter()
        .filter_map(|record| {
            record.impact_entry.map(|impact| ImpactLine {
                impact,
                supplier: record.data.supplier,
                amount: record.data.amount,
            })
        })
        .collect())
}

/// Collection-wide dashboard totals.
pub async fn dashboard_summary(
    store: &dyn DocumentStore,
) -> Result<DashboardSummary, PipelineError> {
    let mut records = store.list().await?;

    let total_invoices = records.len();
    let total_amount: Decimal = records.iter().map(|r| r.data.amount).sum();

    let with_impact: Vec<&ImpactEntry> =
        records.iter().filter_map(|r| r.impact_entry.as_ref()).collect();
    let total_co2_emissions: f64 = with_impact.iter().map(|i| i.co2_emissions).sum();
    let avg_labor_score = if with_impact.is_empty() {
        0.0
    } else {
        let mean: f64 =
            with_impact.iter().map(|i| f64::from(i.labor_score)).sum::<f64>() / with_impact.len() as f64;
        (mean * 10.0).round() / 10.0
    };
    let impact_entries = with_impact.len();

    records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
    records.truncate(RECENT_LIMIT);

    Ok(DashboardSummary {
        total_invoices,
        total_amount,
        // Every persisted record carries its seal, one apiece.
        verified_transactions: total_invoices,
        impact_entries,
        total_co2_emissions,
        avg_labor_score,
        recent_invoices: records,
    })
}
