//! MIME message construction shared by the SMTP and draft sinks.

use lettre::Message;
use lettre::message::{Mailbox, MultiPart};

use dunning_shared::{DunningError, Notice, Recipients, Result};

fn mailbox(customer: &str, address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| DunningError::delivery(customer, format!("invalid address '{address}': {e}")))
}

/// A multipart/alternative (plain + HTML) message for `notice`.
pub fn build_message(
    notice: &Notice,
    to: &Recipients,
    cc: &Recipients,
    from: &str,
) -> Result<Message> {
    if to.is_empty() {
        return Err(DunningError::MissingAddress {
            customer: notice.customer.clone(),
        });
    }

    let mut builder = Message::builder()
        .from(mailbox(&notice.customer, from)?)
        .subject(notice.subject.as_str());
    for address in to.as_slice() {
        builder = builder.to(mailbox(&notice.customer, address)?);
    }
    for address in cc.as_slice() {
        builder = builder.cc(mailbox(&notice.customer, address)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            notice.plain.clone(),
            notice.html.clone(),
        ))
        .map_err(|e| DunningError::delivery(&notice.customer, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::tests::notice;

    #[test]
    fn builds_alternative_message_with_cc() {
        let n = notice("Acme", Some("a@x.com"));
        let to = Recipients::parse("a@x.com; b@y.com");
        let cc = Recipients::parse("ar@rana.test");
        let message = build_message(&n, &to, &cc, "billing@rana.test").expect("message");
        let text = String::from_utf8(message.formatted()).expect("utf8");
        assert!(text.contains("To: a@x.com, b@y.com"));
        assert!(text.contains("Cc: ar@rana.test"));
        assert!(text.contains("From: billing@rana.test"));
        assert!(text.contains("Subject: Rana Analytics - Acme Account Overdue Notice"));
        assert!(text.contains("multipart/alternative"));
    }

    #[test]
    fn empty_recipients_are_missing_address() {
        let n = notice("Acme", None);
        let err = build_message(&n, &Recipients::parse("nobody"), &Recipients::default(), "f@x.com")
            .unwrap_err();
        assert!(matches!(err, DunningError::MissingAddress { .. }));
    }
}
