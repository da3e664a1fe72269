//! Notice rendering for dunning.
//!
//! Turns one customer's rows into a [`Notice`]: invoice-id list, total
//! amount, HTML and plain-text tables, and the message bodies. Rendering is
//! a pure function of the rows and the configured organization details.

pub mod invoice;
pub mod table;
pub mod templates;

use tracing::{debug, instrument};

use dunning_shared::{AppConfig, Notice, OrganizationConfig, PaymentConfig, RowMap};

pub use invoice::{
    AMOUNT_HINTS, INVOICE_HINTS, format_currency, has_hint, invoice_ids, join_ids, parse_amount,
    total_amount,
};
pub use table::{CURRENCY_HINTS, display_value, header_set, html_table, is_currency_column, plain_table};
pub use templates::NoticeFields;

/// Renders notices with fixed organization and payment details.
#[derive(Debug, Clone)]
pub struct Renderer {
    organization: OrganizationConfig,
    payment: PaymentConfig,
}

impl Renderer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            organization: config.organization.clone(),
            payment: config.payment.clone(),
        }
    }

    pub fn subject(&self, customer: &str) -> String {
        templates::subject(&self.organization, customer)
    }

    /// Render the notice for `customer` from its rows.
    #[instrument(skip(self, rows, address), fields(rows = rows.len()))]
    pub fn render(&self, customer: &str, rows: &[RowMap], address: Option<&str>) -> Notice {
        let ids = invoice_ids(rows);
        let invoice_list = join_ids(&ids);
        let total = total_amount(rows);
        let total_text = format_currency(total);

        let fields = NoticeFields {
            customer,
            invoice_list: &invoice_list,
            total: &total_text,
        };
        let html = templates::html_body(&fields, &html_table(rows), &self.organization, &self.payment);
        let plain =
            templates::plain_body(&fields, &plain_table(rows), &self.organization, &self.payment);

        debug!(invoices = ids.len(), total, "notice rendered");

        Notice {
            customer: customer.to_string(),
            address: address.map(str::to_string),
            subject: self.subject(customer),
            html,
            plain,
            total,
            invoice_list,
            invoice_count: ids.len(),
            rows: rows.to_vec(),
        }
    }
}
