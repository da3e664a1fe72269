//! Fixed notice templates. Organization and payment details come from config.

use quick_xml::escape::escape;

use dunning_shared::{OrganizationConfig, PaymentConfig};

/// Values substituted into one customer's notice.
pub struct NoticeFields<'a> {
    pub customer: &'a str,
    pub invoice_list: &'a str,
    /// Already formatted as `$#,##0.00`.
    pub total: &'a str,
}

pub fn subject(organization: &OrganizationConfig, customer: &str) -> String {
    format!("{} - {customer} Account Overdue Notice", organization.name)
}

/// HTML body around a pre-rendered `table`.
pub fn html_body(
    fields: &NoticeFields<'_>,
    table: &str,
    organization: &OrganizationConfig,
    payment: &PaymentConfig,
) -> String {
    let customer = escape(fields.customer);
    let invoices = escape(fields.invoice_list);
    let total = escape(fields.total);
    let legal_name = escape(organization.legal_name.as_str());
    let department = escape(organization.department.as_str());
    let bank = escape(payment.bank_name.as_str());
    let account_name = escape(payment.account_name.as_str());
    let routing = escape(payment.routing_number.as_str());
    let account = escape(payment.account_number.as_str());
    let account_type = escape(payment.account_type.as_str());

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
<div style="max-width: 800px; margin: 0 auto;">
    <p>Dear {customer},</p>

    <p>This is a friendly reminder that your invoice numbers {invoices} are now overdue.
    As per our records, the amount owing is <strong>{total}</strong>.</p>

    <h3 style="color: #2c3e50;">Invoice Details:</h3>
    {table}

    <p>Please kindly send payment through the payment modes we have listed below.</p>

    <p>We appreciate your quick attention to this matter and look forward to our continued partnership.</p>

    <p>Regards,</p>

    <p><strong>{legal_name}</strong><br>
    {department}</p>

    <h3 style="color: #2c3e50;">Payment Information:</h3>
    <ul>
        <li>Bank Name: {bank}</li>
        <li>Account Name: {account_name}</li>
        <li>ACH Routing #: {routing}</li>
        <li>Account #: {account}</li>
        <li>Type of Account: {account_type}</li>
    </ul>
</div>
</body>
</html>
"#
    )
}

/// Plain-text body around a pre-rendered `table`.
pub fn plain_body(
    fields: &NoticeFields<'_>,
    table: &str,
    organization: &OrganizationConfig,
    payment: &PaymentConfig,
) -> String {
    let NoticeFields {
        customer,
        invoice_list,
        total,
    } = fields;
    format!(
        "Dear {customer},

This is a friendly reminder that your invoice numbers {invoice_list} are now overdue.
As per our records, the amount owing is {total}.

INVOICE DETAILS:
{table}
Please kindly send payment through the payment modes we have listed below.

We appreciate your quick attention to this matter and look forward to our continued partnership.

Regards,

{legal_name}
{department}

PAYMENT INFORMATION:
Bank Name: {bank}
Account Name: {account_name}
ACH Routing #: {routing}
Account #: {account}
Type of Account: {account_type}
",
        legal_name = organization.legal_name,
        department = organization.department,
        bank = payment.bank_name,
        account_name = payment.account_name,
        routing = payment.routing_number,
        account = payment.account_number,
        account_type = payment.account_type,
    )
}
