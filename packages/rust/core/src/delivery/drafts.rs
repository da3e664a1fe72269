//! Desktop mail drafts as `.eml` files, used where Outlook automation is
//! unavailable.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use dunning_shared::{DunningError, Notice, Recipients, Result};
use dunning_storage::{PreferenceStore, keys};

use super::{DeliverySummary, Sink, build_message, sanitize_file_name, write_atomic};
use crate::prompt::ChoiceSource;

/// The saved default From address, or ask once and save a non-blank answer.
pub fn resolve_default_from(
    source: &mut dyn ChoiceSource,
    prefs: &mut PreferenceStore,
) -> Result<Option<String>> {
    if let Some(from) = prefs.get(keys::DEFAULT_FROM_EMAIL) {
        return Ok(Some(from.to_string()));
    }
    let answer =
        source.ask("Enter a default From email to use in drafts (press Enter to skip): ")?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(None);
    }
    prefs.set(keys::DEFAULT_FROM_EMAIL, answer);
    Ok(Some(answer.to_string()))
}

/// Hand each draft to the desktop mail client. Returns how many were handed off.
pub fn open_drafts(paths: &[PathBuf], source: &mut dyn ChoiceSource) -> usize {
    let mut opened = 0;
    for path in paths {
        let Some(mut command) = open_command(path) else {
            source.show("Opening drafts is not supported on this platform.");
            return opened;
        };
        match command.status() {
            Ok(status) if status.success() => opened += 1,
            Ok(status) => warn!(path = %path.display(), %status, "mail client refused draft"),
            Err(e) => warn!(path = %path.display(), error = %e, "could not launch mail client"),
        }
    }
    opened
}

fn open_command(path: &Path) -> Option<Command> {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.args(["-a", "Microsoft Outlook"]).arg(path);
        Some(command)
    } else {
        None
    }
}

/// Writes `<dir>/<SanitizedCustomer>.eml` per notice.
pub struct EmlDraftSink {
    dir: PathBuf,
    cc: Recipients,
    from: Option<String>,
    written: Vec<PathBuf>,
}

impl EmlDraftSink {
    pub fn new(dir: impl Into<PathBuf>, cc: Recipients, from: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            cc,
            from,
            written: Vec::new(),
        }
    }

    pub fn file_for(&self, customer: &str) -> PathBuf {
        self.dir
            .join(format!("{}.eml", sanitize_file_name(customer)))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Sender for the draft: the default From, else the first CC, else the
    /// first recipient.
    fn sender<'a>(&'a self, to: &'a Recipients) -> Option<&'a str> {
        self.from
            .as_deref()
            .or_else(|| self.cc.as_slice().first().map(String::as_str))
            .or_else(|| to.as_slice().first().map(String::as_str))
    }
}

impl Sink for EmlDraftSink {
    fn name(&self) -> &str {
        "eml-drafts"
    }

    fn begin(&mut self, source: &mut dyn ChoiceSource) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DunningError::io(&self.dir, e))?;
        source.show(&format!("Saving drafts to: {}", self.dir.display()));
        Ok(())
    }

    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        let to = Recipients::parse(address);
        let from = self
            .sender(&to)
            .ok_or_else(|| DunningError::MissingAddress {
                customer: notice.customer.clone(),
            })?
            .to_string();
        let message = build_message(notice, &to, &self.cc, &from)?;

        let path = self.file_for(&notice.customer);
        write_atomic(&path, &message.formatted())?;
        debug!(path = %path.display(), "draft written");
        source.show(&format!(
            "EML draft saved for: {} -> {}",
            notice.customer,
            path.display()
        ));
        self.written.push(path);
        Ok(())
    }

    fn finish(&mut self, source: &mut dyn ChoiceSource, summary: &DeliverySummary) -> Result<()> {
        source.show(&format!(
            "EML creation summary: {} created, {} skipped.",
            summary.delivered,
            summary.skipped + summary.failed
        ));
        if self.written.is_empty() {
            return Ok(());
        }
        if source.confirm("Open the .eml drafts in your mail client now? (y/N): ")? {
            let opened = open_drafts(&self.written, source);
            info!(opened, "drafts handed to mail client");
            if opened > 0 {
                source.show("Requested the mail client to open the drafts. Save them to place them in Drafts.");
            }
        }
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

    fn store(dir: &Path) -> PreferenceStore {
        PreferenceStore::open_at(dir.join("prefs.json"), None)
    }

    #[test]
    fn default_from_is_asked_once_and_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prefs = store(dir.path());
        let mut source = ScriptedChoices::new([" billing@rana.test "]);
        let from = resolve_default_from(&mut source, &mut prefs).expect("from");
        assert_eq!(from.as_deref(), Some("billing@rana.test"));

        let mut reopened = store(dir.path());
        let mut silent = ScriptedChoices::new(Vec::<String>::new());
        let from = resolve_default_from(&mut silent, &mut reopened).expect("from");
        assert_eq!(from.as_deref(), Some("billing@rana.test"));
        assert!(silent.asked.is_empty());
    }

    #[test]
    fn skipped_default_from_is_not_saved() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut prefs = store(dir.path());
        let mut source = ScriptedChoices::new([""]);
        assert_eq!(resolve_default_from(&mut source, &mut prefs).expect("from"), None);
        assert!(prefs.get(keys::DEFAULT_FROM_EMAIL).is_none());
    }

    #[test]
    fn drafts_are_written_as_eml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let drafts = dir.path().join("Outlook_Drafts_EML");
        let mut sink = EmlDraftSink::new(
            &drafts,
            Recipients::parse("ar@rana.test"),
            Some("billing@rana.test".into()),
        );
        let mut source = ScriptedChoices::new(["n"]);
        let notices = vec![notice("Acme Corp", Some("a@x.com; b@y.com"))];

        let summary =
            deliver_all(&notices, &mut sink, &mut source, &SilentProgress).expect("batch");
        assert_eq!(summary.delivered, 1);

        let eml = std::fs::read_to_string(drafts.join("Acme_Corp.eml")).expect("read");
        assert!(eml.contains("From: billing@rana.test"));
        assert!(eml.contains("To: a@x.com, b@y.com"));
        assert!(eml.contains("Cc: ar@rana.test"));
        assert!(eml.contains("multipart/alternative"));
        assert_eq!(sink.written().len(), 1);
        assert!(source.saw("EML creation summary: 1 created, 0 skipped."));
    }

    #[test]
    fn sender_falls_back_to_first_cc() {
        let sink = EmlDraftSink::new("d", Recipients::parse("ar@rana.test; x@rana.test"), None);
        let to = Recipients::parse("a@x.com");
        assert_eq!(sink.sender(&to), Some("ar@rana.test"));

        let bare = EmlDraftSink::new("d", Recipients::default(), None);
        assert_eq!(bare.sender(&to), Some("a@x.com"));
    }
}
