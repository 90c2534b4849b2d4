//! Expense classification and ledger entry generation.
//!
//! Classification is a keyword lookup, not a model call: the account chart
//! is small and fixed, extraction already burned the latency budget, and a
//! deterministic rule is auditable in a way a classifier model is not.
//!
//! Entries always come in a balanced pair — [`generate_entries`] returns a
//! `[LedgerEntry; 2]` so "exactly one debit and one credit" is enforced by
//! the type, not by a runtime check. The system encodes single-transaction
//! invoices only: no splitting, no partial payments.

use uuid::Uuid;

use crate::model::{EntryType, InvoiceData, LedgerEntry};

/// Debit account for office/equipment/software purchases.
pub const OFFICE_EXPENSES: &str = "Office Expenses";
/// Debit account for stock and raw materials.
pub const INVENTORY: &str = "Inventory";
/// Debit account for consulting and professional work.
pub const PROFESSIONAL_SERVICES: &str = "Professional Services";
/// Debit account for anything unmatched.
pub const GENERAL_EXPENSES: &str = "General Expenses";
/// Credit account for every invoice — invoices are modelled as creating
/// payables, never immediate cash settlement.
pub const ACCOUNTS_PAYABLE: &str = "Accounts Payable";

const OFFICE_KEYWORDS: [&str; 4] = ["office", "supplies", "equipment", "software"];
const INVENTORY_KEYWORDS: [&str; 3] = ["inventory", "materials", "goods"];
const SERVICE_KEYWORDS: [&str; 3] = ["service", "consulting", "professional"];

/// Map a free-text description to a debit account.
///
/// Pure and total: case-insensitive substring containment, evaluated in
/// fixed priority order (office → inventory → services), first match wins.
/// Anything unmatched is [`GENERAL_EXPENSES`].
pub fn classify_expense(description: &str) -> &'static str {
    let description = description.to_lowercase();
    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| description.contains(k));

    if contains_any(&OFFICE_KEYWORDS) {
        OFFICE_EXPENSES
    } else if contains_any(&INVENTORY_KEYWORDS) {
        INVENTORY
    } else if contains_any(&SERVICE_KEYWORDS) {
        PROFESSIONAL_SERVICES
    } else {
        GENERAL_EXPENSES
    }
}

/// Generate the balanced entry pair for one invoice: debit first, credit
/// second, both carrying the full invoice amount and the invoice's stated
/// date (not the upload instant).
pub fn generate_entries(data: &InvoiceData, invoice_id: Uuid) -> [LedgerEntry; 2] {
    let debit_account = classify_expense(&data.description);

    [
        LedgerEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Debit,
            account: debit_account.to_string(),
            amount: data.amount,
            invoice_id,
            date: data.date.clone(),
        },
        LedgerEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Credit,
            account: ACCOUNTS_PAYABLE.to_string(),
            amount: data.amount,
            invoice_id,
            date: data.date.clone(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(description: &str) -> InvoiceData {
        InvoiceData {
            date: "2025-02-15".to_string(),
            supplier: "Paper Co".to_string(),
            amount: dec!(123.45),
            description: description.to_string(),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn classifies_each_category() {
        assert_eq!(classify_expense("New office chairs"), OFFICE_EXPENSES);
        assert_eq!(classify_expense("software licence renewal"), OFFICE_EXPENSES);
        assert_eq!(classify_expense("raw materials delivery"), INVENTORY);
        assert_eq!(classify_expense("finished goods shipment"), INVENTORY);
        assert_eq!(classify_expense("consulting engagement Q1"), PROFESSIONAL_SERVICES);
        assert_eq!(classify_expense("monthly cleaning service"), PROFESSIONAL_SERVICES);
        assert_eq!(classify_expense("travel reimbursement"), GENERAL_EXPENSES);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_expense("OFFICE SUPPLIES"), OFFICE_EXPENSES);
        assert_eq!(classify_expense("Inventory Restock"), INVENTORY);
    }

    #[test]
    fn priority_order_first_match_wins() {
        // Matches both the office and services keyword lists; office wins.
        assert_eq!(
            classify_expense("office supplies and consulting"),
            OFFICE_EXPENSES
        );
        // Matches inventory and services; inventory wins.
        assert_eq!(
            classify_expense("materials for professional install"),
            INVENTORY
        );
    }

    #[test]
    fn classification_is_total_and_idempotent() {
        for description in ["", "???", "office", "совершенно unrelated"] {
            let first = classify_expense(description);
            let second = classify_expense(description);
            assert_eq!(first, second);
            assert!([
                OFFICE_EXPENSES,
                INVENTORY,
                PROFESSIONAL_SERVICES,
                GENERAL_EXPENSES
            ]
            .contains(&first));
        }
    }

    #[test]
    fn entry_pair_is_balanced() {
        let data = invoice("Office supplies");
        let invoice_id = Uuid::new_v4();
        let [debit, credit] = generate_entries(&data, invoice_id);

        assert_eq!(debit.entry_type, EntryType::Debit);
        assert_eq!(credit.entry_type, EntryType::Credit);
        assert_eq!(debit.account, OFFICE_EXPENSES);
        assert_eq!(credit.account, ACCOUNTS_PAYABLE);
        assert_eq!(debit.amount, dec!(123.45));
        assert_eq!(credit.amount, dec!(123.45));
        assert_eq!(debit.date, "2025-02-15");
        assert_eq!(credit.date, "2025-02-15");
        assert_eq!(debit.invoice_id, invoice_id);
        assert_eq!(credit.invoice_id, invoice_id);
        assert_ne!(debit.id, credit.id);
    }

    #[test]
    fn entries_carry_invoice_date_not_today() {
        let mut data = invoice("General stuff");
        data.date = "1999-12-31".to_string();
        let [debit, credit] = generate_entries(&data, Uuid::new_v4());
        assert_eq!(debit.date, "1999-12-31");
        assert_eq!(credit.date, "1999-12-31");
    }
}
