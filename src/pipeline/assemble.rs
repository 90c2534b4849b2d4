//! Invoice assembly: the single factory for complete records.
//!
//! Entry-pair generation and transaction sealing happen inside one
//! construction so a record with a missing seal or an unbalanced ledger is
//! unrepresentable at rest — there is no partially-assembled intermediate
//! for callers to persist.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::model::{InvoiceData, InvoiceRecord};
use crate::pipeline::{classify, verify};

/// Compose the complete record for one processed invoice.
///
/// Generates the invoice id (v4, treated as globally unique), stamps the
/// upload instant, derives the balanced entry pair and its verification
/// seal, and base64-encodes the original upload bytes for storage/replay.
pub fn assemble(filename: &str, file_bytes: &[u8], data: InvoiceData) -> InvoiceRecord {
    let id = Uuid::new_v4();
    let entries = classify::generate_entries(&data, id);
    let verified_transaction = verify::seal(id, &entries);

    debug!(invoice_id = %id, filename, "Assembled invoice record");

    InvoiceRecord {
        id,
        filename: filename.to_string(),
        upload_date: Utc::now(),
        data,
        ledger_entries: entries.to_vec(),
        verified_transaction,
        impact_entry: None,
        file_content: STANDARD.encode(file_bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryType;
    use crate::pipeline::verify::is_intact;
    use rust_decimal_macros::dec;

    fn data() -> InvoiceData {
        InvoiceData {
            date: "2025-02-15".to_string(),
            supplier: "Paper Co".to_string(),
            amount: dec!(123.45),
            description: "Office supplies".to_string(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn record_upholds_the_core_invariants() {
        let record = assemble("invoice.png", b"bytes", data());

        assert_eq!(record.ledger_entries.len(), 2);
        assert_eq!(record.ledger_entries[0].entry_type, EntryType::Debit);
        assert_eq!(record.ledger_entries[1].entry_type, EntryType::Credit);
        assert_eq!(record.debit_total(), dec!(123.45));
        assert_eq!(record.credit_total(), dec!(123.45));
        assert_eq!(record.debit_total(), record.data.amount);

        assert_eq!(record.verified_transaction.invoice_id, record.id);
        for entry in &record.ledger_entries {
            assert_eq!(entry.invoice_id, record.id);
        }
        assert!(record.impact_entry.is_none());
    }

    #[test]
    fn seal_covers_the_assembled_entries() {
        let record = assemble("invoice.png", b"bytes", data());
        let entries: [_; 2] = record.ledger_entries.clone().try_into().unwrap();
        assert!(is_intact(&record.verified_transaction, &entries));
    }

    #[test]
    fn file_content_round_trips() {
        let bytes = vec![0u8, 1, 2, 254, 255];
        let record = assemble("scan.jpg", &bytes, data());
        assert_eq!(STANDARD.decode(&record.file_content).unwrap(), bytes);
        assert_eq!(record.filename, "scan.jpg");
    }

    #[test]
    fn each_record_gets_a_fresh_id() {
        let a = assemble("a.png", b"a", data());
        let b = assemble("b.png", b"b", data());
        assert_ne!(a.id, b.id);
        assert_ne!(a.verified_transaction.hash, b.verified_transaction.hash);
    }
}
