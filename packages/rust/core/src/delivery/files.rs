//! HTML files for manual sending: `<dir>/<SanitizedCustomer>_email.html`.

use std::path::PathBuf;

use tracing::debug;

use dunning_shared::{DunningError, Notice, Result};
use dunning_render::format_currency;

use super::{DeliverySummary, Sink, sanitize_file_name, write_atomic};
use crate::prompt::ChoiceSource;

pub struct HtmlFileSink {
    dir: PathBuf,
}

impl HtmlFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target file for `customer`.
    pub fn file_for(&self, customer: &str) -> PathBuf {
        self.dir
            .join(format!("{}_email.html", sanitize_file_name(customer)))
    }

    fn display_dir(&self) -> String {
        std::path::absolute(&self.dir)
            .unwrap_or_else(|_| self.dir.clone())
            .display()
            .to_string()
    }
}

impl Sink for HtmlFileSink {
    fn name(&self) -> &str {
        "html-files"
    }

    fn begin(&mut self, source: &mut dyn ChoiceSource) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DunningError::io(&self.dir, e))?;
        source.show(&format!("Saving emails to: {}", self.display_dir()));
        Ok(())
    }

    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        let path = self.file_for(&notice.customer);
        write_atomic(&path, notice.html.as_bytes())?;
        debug!(path = %path.display(), "notice written");

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        source.show(&format!("Email saved for: {}", notice.customer));
        source.show(&format!("   File: {file_name}"));
        source.show(&format!("   To: {address}"));
        source.show(&format!("   Total Amount: {}", format_currency(notice.total)));
        source.show(&format!("   Invoices: {}", notice.invoice_list));
        source.show("");
        Ok(())
    }

    fn finish(&mut self, source: &mut dyn ChoiceSource, _summary: &DeliverySummary) -> Result<()> {
        source.show(&format!("All emails saved in: {}", self.display_dir()));
        source.show(
            "Open these HTML files in a browser and copy/paste the content into your email client.",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::deliver_all;
    use crate::delivery::tests::notice;
    use crate::pipeline::SilentProgress;
    use crate::prompt::ScriptedChoices;

    #[test]
    fn writes_one_file_per_customer() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("Customer_Emails");
        let mut sink = HtmlFileSink::new(&out);
        let mut source = ScriptedChoices::new(Vec::<String>::new());
        let notices = vec![
            notice("Acme Corp", Some("ap@acme.com")),
            notice("Beta, LLC", Some("b@beta.com")),
        ];

        let summary =
            deliver_all(&notices, &mut sink, &mut source, &SilentProgress).expect("batch");
        assert_eq!(summary.delivered, 2);
        assert!(sink.file_for("Acme Corp").exists());
        let html = std::fs::read_to_string(out.join("Beta_LLC_email.html")).expect("read");
        assert_eq!(html, "<p>html</p>");
        assert!(source.saw("   File: Acme_Corp_email.html"));
        assert!(source.saw("   Total Amount: $10.00"));
    }
}
