//! Address book: customer → canonical recipient string, from the emails sheet.

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use dunning_shared::{RawTable, Recipients, Result};
use dunning_storage::PreferenceStore;

use crate::aggregator::normalize_table;
use crate::prompt::ChoiceSource;
use crate::selector::{EMAILS_ADDRESS, EMAILS_CUSTOMER, select_column};

/// Customer → comma-joined address list.
///
/// No referential integrity with the customer records is enforced: entries
/// may name customers without invoices and vice versa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressBook {
    entries: HashMap<String, String>,
}

/// A row whose address cell had no `@`.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidAddress {
    pub customer: String,
    pub address: String,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, customer: &str) -> Option<&str> {
        self.entries.get(customer).map(String::as_str)
    }

    /// Store `address` (already canonical) for `customer`, replacing any earlier one.
    pub fn insert(&mut self, customer: impl Into<String>, address: impl Into<String>) {
        self.entries.insert(customer.into(), address.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collect addresses from `table` given its customer and email columns.
    ///
    /// A row counts when both cells are non-empty and the address contains
    /// `@`; later rows replace earlier ones. Rows with a non-empty address
    /// lacking `@` are returned as invalid.
    pub fn from_columns(
        table: &RawTable,
        customer_column: &str,
        email_column: &str,
    ) -> (Self, Vec<InvalidAddress>) {
        let mut book = Self::new();
        let mut invalid = Vec::new();
        for row in 0..table.len() {
            let text = |column: &str| {
                table
                    .cell(row, column)
                    .map(|c| c.to_string().trim().to_string())
                    .unwrap_or_default()
            };
            let customer = text(customer_column);
            let address = text(email_column);
            if customer.is_empty() || address.is_empty() {
                continue;
            }
            if !address.contains('@') {
                invalid.push(InvalidAddress { customer, address });
                continue;
            }
            let recipients = Recipients::parse(&address);
            if !recipients.is_empty() {
                book.insert(customer, recipients.for_mime());
            }
        }
        (book, invalid)
    }
}

/// Build the address book from an emails sheet, asking for its columns.
///
/// An empty sheet yields an empty book without prompting.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn build_address_book(
    source: &mut dyn ChoiceSource,
    prefs: &mut PreferenceStore,
    mut table: RawTable,
) -> Result<AddressBook> {
    if table.is_empty() {
        source.show("No emails sheet provided; addresses will be asked for during delivery.");
        return Ok(AddressBook::new());
    }

    normalize_table(&mut table);
    source.show(&format!("Email sheet columns: {}", table.columns().join(", ")));

    let columns = table.columns().to_vec();
    let Some(customer_column) = select_column(source, prefs, &columns, &EMAILS_CUSTOMER)? else {
        return Ok(AddressBook::new());
    };
    let Some(email_column) = select_column(source, prefs, &columns, &EMAILS_ADDRESS)? else {
        return Ok(AddressBook::new());
    };

    let (book, invalid) = AddressBook::from_columns(&table, &customer_column, &email_column);
    for entry in &invalid {
        warn!(customer = %entry.customer, address = %entry.address, "invalid email address");
        source.show(&format!(
            "  Invalid email for {}: {}",
            entry.customer, entry.address
        ));
    }
    info!(addresses = book.len(), invalid = invalid.len(), "address book built");
    source.show(&format!("Found {} customer email addresses", book.len()));
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedChoices;
    use dunning_shared::CellValue;

    fn emails_table() -> RawTable {
        RawTable::new(
            vec!["customer ".into(), " EMAIL".into()],
            vec![
                vec!["Acme".into(), "a@x.com; b@y.com".into()],
                vec!["Beta".into(), "not-an-address".into()],
                vec!["Gamma".into(), CellValue::Empty],
                vec!["Acme".into(), "ap@acme.com".into()],
                vec![CellValue::Empty, "orphan@x.com".into()],
            ],
        )
    }

    #[test]
    fn later_rows_win_and_invalid_are_reported() {
        let mut table = emails_table();
        normalize_table(&mut table);
        let (book, invalid) = AddressBook::from_columns(&table, "Customer", "Email");
        assert_eq!(book.get("Acme"), Some("ap@acme.com"));
        assert_eq!(book.len(), 1);
        assert_eq!(
            invalid,
            vec![InvalidAddress {
                customer: "Beta".into(),
                address: "not-an-address".into(),
            }]
        );
    }

    #[test]
    fn separators_are_canonicalized_to_commas() {
        let table = RawTable::new(
            vec!["Customer".into(), "Email".into()],
            vec![vec!["Acme".into(), "a@x.com; b@y.com, bogus".into()]],
        );
        let (book, _) = AddressBook::from_columns(&table, "Customer", "Email");
        assert_eq!(book.get("Acme"), Some("a@x.com, b@y.com"));
    }

    #[test]
    fn build_prompts_for_both_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prefs = PreferenceStore::open_at(dir.path().join("prefs.json"), None);
        let mut source = ScriptedChoices::new(["1", "2"]);

        let book = build_address_book(&mut source, &mut prefs, emails_table()).expect("build");
        assert_eq!(book.get("Acme"), Some("ap@acme.com"));
        assert!(source.saw("Invalid email for Beta: not-an-address"));
        assert_eq!(prefs.get("emails_customer_column"), Some("Customer"));
        assert_eq!(prefs.get("emails_email_column"), Some("Email"));
    }

    #[test]
    fn empty_sheet_needs_no_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prefs = PreferenceStore::open_at(dir.path().join("prefs.json"), None);
        let mut source = ScriptedChoices::new(Vec::<String>::new());
        let book = build_address_book(&mut source, &mut prefs, RawTable::empty()).expect("build");
        assert!(book.is_empty());
        assert!(source.asked.is_empty());
    }
}
