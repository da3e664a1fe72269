//! Outlook drafts on Windows through COM automation.
//!
//! Each draft is created by a PowerShell subprocess driving
//! `Outlook.Application`, so no COM bindings are linked in. Bodies are staged
//! in temp files and read back with `Get-Content -Raw`, which keeps large
//! notices off the command line.

use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use dunning_shared::{DunningError, Notice, Recipients, Result};

use super::{DeliverySummary, Sink};
use crate::prompt::ChoiceSource;

const NAME: &str = "outlook-drafts";

/// `olFolderDrafts` in the Outlook object model.
const DRAFTS_FOLDER: u32 = 16;

/// Saves each notice into the Outlook Drafts folder.
pub struct OutlookDraftSink {
    cc: Recipients,
    from: Option<String>,
}

impl OutlookDraftSink {
    pub fn new(cc: Recipients, from: Option<String>) -> Self {
        Self { cc, from }
    }

    /// Outlook COM automation only exists on Windows.
    pub fn applies() -> bool {
        cfg!(windows)
    }

    /// Script that creates and saves one draft.
    fn script(&self, notice: &Notice, to: &str, plain: &Path, html: &Path) -> String {
        let mut script = format!(
            "$ErrorActionPreference = 'Stop'\n\
             $outlook = New-Object -ComObject Outlook.Application\n\
             $mail = $outlook.CreateItem(0)\n\
             $mail.Subject = '{subject}'\n\
             $mail.To = '{to}'\n\
             $mail.CC = '{cc}'\n",
            subject = literal(&notice.subject),
            to = literal(to),
            cc = literal(&self.cc.for_desktop()),
        );
        if let Some(from) = &self.from {
            // Needs send-on-behalf rights in the profile; a refusal is not fatal.
            script.push_str(&format!(
                "try {{ $mail.SentOnBehalfOfName = '{}' }} catch {{ }}\n",
                literal(from)
            ));
        }
        script.push_str(&format!(
            "$mail.Body = Get-Content -LiteralPath '{}' -Raw -Encoding UTF8\n\
             $mail.HTMLBody = Get-Content -LiteralPath '{}' -Raw -Encoding UTF8\n\
             $mail.Save()",
            literal(&plain.to_string_lossy()),
            literal(&html.to_string_lossy()),
        ));
        script
    }
}

/// Single quotes inside a PowerShell literal are escaped by doubling.
fn literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Recipients in Outlook's semicolon form, or the raw answer if none parse.
fn outlook_recipients(address: &str) -> String {
    let parsed = Recipients::parse(address);
    if parsed.is_empty() {
        address.trim().to_string()
    } else {
        parsed.for_desktop()
    }
}

/// Write `text` to a temp file that lives as long as the handle.
fn stage(text: &str, suffix: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("dunning_body_")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| DunningError::io(std::env::temp_dir(), e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| DunningError::io(file.path(), e))?;
    Ok(file)
}

fn run_powershell(script: &str) -> Result<String> {
    let output = Command::new("powershell")
        .args(["-NoProfile", "-NonInteractive", "-Command"])
        .arg(script)
        .output()
        .map_err(|e| DunningError::strategy(NAME, format!("failed to spawn powershell: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DunningError::strategy(
            NAME,
            format!("outlook automation exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl Sink for OutlookDraftSink {
    fn name(&self) -> &str {
        NAME
    }

    fn begin(&mut self, source: &mut dyn ChoiceSource) -> Result<()> {
        source.show("Creating Outlook draft emails...");
        run_powershell(
            "$ErrorActionPreference = 'Stop'\n\
             $null = New-Object -ComObject Outlook.Application",
        )
        .map_err(|e| {
            source.show(&format!(
                "Could not access Outlook. Ensure Outlook is installed and configured. Details: {e}"
            ));
            e
        })?;
        Ok(())
    }

    #[instrument(skip_all, fields(customer = %notice.customer))]
    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        let plain = stage(&notice.plain, ".txt")?;
        let html = stage(&notice.html, ".html")?;
        let script = self.script(
            notice,
            &outlook_recipients(address),
            plain.path(),
            html.path(),
        );
        run_powershell(&script).map_err(|e| DunningError::delivery(&notice.customer, e))?;
        debug!("outlook draft saved");
        source.show(&format!(
            "Draft created for: {} ({address})",
            notice.customer
        ));
        Ok(())
    }

    fn finish(&mut self, source: &mut dyn ChoiceSource, summary: &DeliverySummary) -> Result<()> {
        source.show(&format!(
            "Draft creation summary: {} created, {} skipped.",
            summary.delivered,
            summary.skipped + summary.failed
        ));
        let count = format!(
            "$outlook = New-Object -ComObject Outlook.Application\n\
             $outlook.GetNamespace('MAPI').GetDefaultFolder({DRAFTS_FOLDER}).Items.Count"
        );
        match run_powershell(&count) {
            Ok(items) => {
                info!(items = %items, "outlook drafts folder counted");
                source.show(&format!(
                    "Outlook Drafts folder now contains approximately {items} items."
                ));
            }
            Err(e) => warn!(error = %e, "could not count outlook drafts"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::tests::notice;

    fn sink(from: Option<&str>) -> OutlookDraftSink {
        OutlookDraftSink::new(
            Recipients::parse("ar@rana.test, exec@rana.test"),
            from.map(String::from),
        )
    }

    #[test]
    fn script_uses_semicolon_recipients_and_escapes_quotes() {
        let notice = notice("O'Brien Ltd", Some("a@x.com, b@y.com"));
        let to = outlook_recipients("a@x.com, b@y.com");
        let script = sink(None).script(
            &notice,
            &to,
            Path::new("C:/Temp/body.txt"),
            Path::new("C:/Temp/it's.html"),
        );

        assert!(script.contains("$mail.Subject = 'Rana Analytics - O''Brien Ltd Account Overdue Notice'"));
        assert!(script.contains("$mail.To = 'a@x.com; b@y.com'"));
        assert!(script.contains("$mail.CC = 'ar@rana.test; exec@rana.test'"));
        assert!(script.contains("Get-Content -LiteralPath 'C:/Temp/it''s.html' -Raw"));
        assert!(script.ends_with("$mail.Save()"));
        assert!(!script.contains("SentOnBehalfOfName"));
    }

    #[test]
    fn default_from_sets_sent_on_behalf() {
        let notice = notice("Acme", Some("a@x.com"));
        let script = sink(Some("billing@rana.test")).script(
            &notice,
            "a@x.com",
            Path::new("p.txt"),
            Path::new("h.html"),
        );
        assert!(script.contains("try { $mail.SentOnBehalfOfName = 'billing@rana.test' } catch { }"));
    }

    #[test]
    fn unparsed_answer_is_passed_through() {
        assert_eq!(outlook_recipients("  not-an-address "), "not-an-address");
    }

    #[test]
    fn staged_body_holds_the_text() {
        let staged = stage("<p>Overdue</p>", ".html").expect("stage");
        let text = std::fs::read_to_string(staged.path()).expect("read");
        assert_eq!(text, "<p>Overdue</p>");
        let path = staged.path().to_path_buf();
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn applies_only_on_windows() {
        assert_eq!(OutlookDraftSink::applies(), cfg!(windows));
    }
}
