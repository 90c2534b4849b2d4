//! Transaction sealing: a deterministic digest over an invoice's entry pair.
//!
//! The hash input is a plain string concatenation, in this exact order:
//! invoice id, then the creation timestamp, then for each entry in
//! generation order (debit, credit) its `type + account + amount`. Amounts
//! enter the string through `Decimal`'s display form with no fixed-point
//! normalisation — `100.00` and `100` hash differently, so the same
//! rendering must be used when recomputing (see [`recompute`]).
//!
//! Because the timestamp is embedded, the hash is **not** a content address:
//! it attests "this exact set of entries was sealed at this exact instant".
//! Sealing identical entries twice yields two different digests. The sealed
//! instant is persisted verbatim on the [`VerifiedTransaction`], which is
//! what keeps the digest recomputable from the stored record alone.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::model::{LedgerEntry, VerifiedTransaction, VERIFIED};

/// Canonical timestamp rendering used in the hash input.
///
/// Fixed microsecond precision: `to_rfc3339`'s default variable precision
/// would make a stored timestamp hash differently after a serde round-trip.
fn timestamp_repr(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Build the exact string that gets digested.
pub fn hash_input(
    invoice_id: Uuid,
    timestamp: &DateTime<Utc>,
    entries: &[LedgerEntry; 2],
) -> String {
    let mut input = format!("{invoice_id}{}", timestamp_repr(timestamp));
    for entry in entries {
        input.push_str(&format!(
            "{}{}{}",
            entry.entry_type, entry.account, entry.amount
        ));
    }
    input
}

/// Seal an entry pair at the current instant.
pub fn seal(invoice_id: Uuid, entries: &[LedgerEntry; 2]) -> VerifiedTransaction {
    seal_at(invoice_id, entries, Utc::now())
}

/// Seal an entry pair at an explicit instant.
///
/// Exists separately from [`seal`] so the timestamp-sensitivity of the
/// digest is exercisable without racing the clock.
pub fn seal_at(
    invoice_id: Uuid,
    entries: &[LedgerEntry; 2],
    timestamp: DateTime<Utc>,
) -> VerifiedTransaction {
    let mut hasher = Sha256::new();
    hasher.update(hash_input(invoice_id, &timestamp, entries).as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    VerifiedTransaction {
        id: Uuid::new_v4(),
        hash,
        timestamp,
        invoice_id,
        status: VERIFIED.to_string(),
    }
}

/// Recompute the digest for a stored transaction from its persisted fields.
pub fn recompute(tx: &VerifiedTransaction, entries: &[LedgerEntry; 2]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(hash_input(tx.invoice_id, &tx.timestamp, entries).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Whether the stored entries still match the sealed digest.
///
/// Creation-time attestation only: the pipeline never re-verifies on its
/// own, but a caller holding a record can.
pub fn is_intact(tx: &VerifiedTransaction, entries: &[LedgerEntry; 2]) -> bool {
    recompute(tx, entries) == tx.hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvoiceData;
    use crate::pipeline::classify::generate_entries;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn entries(invoice_id: Uuid) -> [LedgerEntry; 2] {
        let data = InvoiceData {
            date: "2025-02-15".to_string(),
            supplier: "Paper Co".to_string(),
            amount: dec!(123.45),
            description: "Office supplies".to_string(),
            currency: "USD".to_string(),
        };
        generate_entries(&data, invoice_id)
    }

    #[test]
    fn hash_is_64_lowercase_hex_chars() {
        let invoice_id = Uuid::new_v4();
        let tx = seal(invoice_id, &entries(invoice_id));
        assert_eq!(tx.hash.len(), 64);
        assert!(tx.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn seal_sets_identity_fields() {
        let invoice_id = Uuid::new_v4();
        let tx = seal(invoice_id, &entries(invoice_id));
        assert_eq!(tx.invoice_id, invoice_id);
        assert_eq!(tx.status, VERIFIED);
    }

    #[test]
    fn digest_is_deterministic_for_fixed_input() {
        let invoice_id = Uuid::new_v4();
        let entries = entries(invoice_id);
        let ts = Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap();

        let a = seal_at(invoice_id, &entries, ts);
        let b = seal_at(invoice_id, &entries, ts);
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn different_timestamps_change_the_digest() {
        let invoice_id = Uuid::new_v4();
        let entries = entries(invoice_id);
        let t1 = Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap();
        let t2 = t1 + chrono::Duration::microseconds(1);

        let a = seal_at(invoice_id, &entries, t1);
        let b = seal_at(invoice_id, &entries, t2);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn hash_input_layout() {
        let invoice_id = Uuid::new_v4();
        let entries = entries(invoice_id);
        let ts = Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap();

        let input = hash_input(invoice_id, &ts, &entries);
        assert!(input.starts_with(&invoice_id.to_string()));
        assert!(input.contains("debitOffice Expenses123.45"));
        assert!(input.ends_with("creditAccounts Payable123.45"));
    }

    #[test]
    fn recompute_matches_and_detects_tampering() {
        let invoice_id = Uuid::new_v4();
        let mut entries = entries(invoice_id);
        let tx = seal(invoice_id, &entries);

        assert!(is_intact(&tx, &entries));

        entries[0].amount = dec!(999.99);
        assert!(!is_intact(&tx, &entries));
    }

    #[test]
    fn amount_scale_is_significant() {
        // 100 and 100.00 are numerically equal but render differently, and
        // the digest is over the rendering.
        let invoice_id = Uuid::new_v4();
        let ts = Utc.with_ymd_and_hms(2025, 2, 15, 12, 0, 0).unwrap();

        let mut plain = entries(invoice_id);
        plain[0].amount = dec!(100);
        plain[1].amount = dec!(100);

        let mut scaled = entries(invoice_id);
        scaled[0].amount = dec!(100.00);
        scaled[1].amount = dec!(100.00);

        let a = seal_at(invoice_id, &plain, ts);
        let b = seal_at(invoice_id, &scaled, ts);
        assert_ne!(a.hash, b.hash);
    }
}
