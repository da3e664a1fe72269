//! Delivery sinks and the batch driver.
//!
//! A [`Sink`] consumes one [`Notice`] at a time. [`deliver_all`] asks for
//! missing addresses, isolates per-customer failures, and returns a
//! [`DeliverySummary`]; only a closed input or a sink's own setup/teardown
//! failure aborts the batch.

mod drafts;
mod files;
mod message;
mod outlook;
mod smtp;
mod terminal;
mod workbook_export;

use std::path::Path;

use tracing::{info, instrument, warn};

use dunning_shared::{AppConfig, DunningError, Notice, Recipients, Result};
use dunning_storage::PreferenceStore;

use crate::pipeline::{PreparedRun, ProgressReporter};
use crate::prompt::ChoiceSource;

pub use drafts::{EmlDraftSink, open_drafts, resolve_default_from};
pub use files::HtmlFileSink;
pub use message::build_message;
pub use outlook::OutlookDraftSink;
pub use smtp::{SmtpSettings, SmtpSink};
pub use terminal::TerminalSink;
pub use workbook_export::{WorkbookExportSink, export_path, safe_sheet_name};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A destination for rendered notices.
pub trait Sink {
    /// Human-readable sink name for tracing.
    fn name(&self) -> &str;

    /// Whether a notice without an address must get one before delivery.
    fn requires_address(&self) -> bool {
        true
    }

    /// Called once before the first notice.
    fn begin(&mut self, _source: &mut dyn ChoiceSource) -> Result<()> {
        Ok(())
    }

    /// Deliver one notice to `address` (empty when none is known and the
    /// sink does not require one).
    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()>;

    /// Called once after the last notice.
    fn finish(
        &mut self,
        _source: &mut dyn ChoiceSource,
        _summary: &DeliverySummary,
    ) -> Result<()> {
        Ok(())
    }
}

/// Per-batch outcome counts.
#[derive(Debug, Default)]
pub struct DeliverySummary {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One [`DunningError::DeliveryFailure`] per failed customer.
    pub failures: Vec<DunningError>,
}

// ---------------------------------------------------------------------------
// Output modes
// ---------------------------------------------------------------------------

/// The five output modes of the delivery menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Smtp,
    HtmlFiles,
    Terminal,
    WorkbookExport,
    Drafts,
}

impl OutputMode {
    pub const MENU: [(Self, &'static str); 5] = [
        (Self::Smtp, "Send emails automatically (requires SMTP setup)"),
        (Self::HtmlFiles, "Save emails as files for manual sending"),
        (Self::Terminal, "Display emails in terminal for copy/paste"),
        (Self::WorkbookExport, "Export to a spreadsheet workbook"),
        (Self::Drafts, "Save emails as Outlook drafts"),
    ];

    /// Parse a menu answer; `None` for anything but `1`..`5`.
    pub fn from_choice(answer: &str) -> Option<Self> {
        let n: usize = answer.trim().parse().ok()?;
        Self::MENU.get(n.checked_sub(1)?).map(|(mode, _)| *mode)
    }
}

/// Show the output menu and read a mode. Invalid answers fall back to
/// [`OutputMode::HtmlFiles`].
pub fn choose_output_mode(source: &mut dyn ChoiceSource) -> Result<OutputMode> {
    source.show("");
    source.show("Choose an option:");
    for (i, (_, label)) in OutputMode::MENU.iter().enumerate() {
        source.show(&format!("{}. {label}", i + 1));
    }
    let answer = source.ask("Enter your choice (1-5): ")?;
    Ok(OutputMode::from_choice(&answer).unwrap_or_else(|| {
        source.show("Invalid choice. Saving emails to files instead.");
        OutputMode::HtmlFiles
    }))
}

/// Build the sink for `mode`, asking for any settings it needs.
pub fn build_sink(
    mode: OutputMode,
    config: &AppConfig,
    run: &PreparedRun,
    source: &mut dyn ChoiceSource,
    prefs: &mut PreferenceStore,
) -> Result<Box<dyn Sink>> {
    let cc = Recipients::from_vec(config.mail.cc.clone());
    let sink: Box<dyn Sink> = match mode {
        OutputMode::Smtp => {
            let settings = SmtpSettings::prompt(source, config, prefs)?;
            Box::new(SmtpSink::connect(&settings, cc)?)
        }
        OutputMode::HtmlFiles => Box::new(HtmlFileSink::new(&config.output.directory)),
        OutputMode::Terminal => Box::new(TerminalSink::new(cc)),
        OutputMode::WorkbookExport => Box::new(WorkbookExportSink::new(
            export_path(&run.workbook.original, &config.output.export_suffix),
            cc,
        )),
        OutputMode::Drafts => {
            let from = resolve_default_from(source, prefs)?;
            if OutlookDraftSink::applies() {
                Box::new(OutlookDraftSink::new(cc, from))
            } else {
                let dir = Path::new(&config.output.directory).join(&config.output.drafts_subdir);
                Box::new(EmlDraftSink::new(dir, cc, from))
            }
        }
    };
    Ok(sink)
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

/// Deliver every notice through `sink`, one customer at a time.
#[instrument(skip_all, fields(sink = sink.name(), notices = notices.len()))]
pub fn deliver_all(
    notices: &[Notice],
    sink: &mut dyn Sink,
    source: &mut dyn ChoiceSource,
    progress: &dyn ProgressReporter,
) -> Result<DeliverySummary> {
    let mut summary = DeliverySummary::default();
    sink.begin(source)?;

    for (i, notice) in notices.iter().enumerate() {
        progress.customer(&notice.customer, i + 1, notices.len());

        let address = match notice.address.as_deref() {
            Some(address) => address.to_string(),
            None if sink.requires_address() => {
                let answer =
                    source.ask(&format!("Enter email address for {}: ", notice.customer))?;
                let answer = answer.trim();
                if answer.is_empty() {
                    let reason = DunningError::MissingAddress {
                        customer: notice.customer.clone(),
                    };
                    warn!(error = %reason, "skipping customer");
                    source.show(&format!("Skipping {} (no email)", notice.customer));
                    summary.skipped += 1;
                    continue;
                }
                answer.to_string()
            }
            None => String::new(),
        };

        match sink.deliver(notice, &address, source) {
            Ok(()) => summary.delivered += 1,
            Err(e @ DunningError::InputClosed { .. }) => return Err(e),
            Err(e) => {
                warn!(customer = %notice.customer, error = %e, "delivery failed");
                source.show(&format!("Failed for {}: {e}", notice.customer));
                summary.failed += 1;
                let failure = match e {
                    DunningError::DeliveryFailure { .. } => e,
                    other => DunningError::delivery(&notice.customer, other),
                };
                summary.failures.push(failure);
            }
        }
    }

    sink.finish(source, &summary)?;
    info!(
        delivered = summary.delivered,
        skipped = summary.skipped,
        failed = summary.failed,
        "delivery finished"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// File-name stem for a customer: alphanumerics, space, `-` and `_` kept,
/// trailing whitespace trimmed, spaces turned into `_`.
pub fn sanitize_file_name(customer: &str) -> String {
    let kept: String = customer
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = kept.trim_end().replace(' ', "_");
    if stem.is_empty() {
        "Customer".to_string()
    } else {
        stem
    }
}

/// Write `contents` to `target` through a temp file and a rename.
pub(crate) fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| DunningError::io(dir, e))?;
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{file_name}.tmp"));
    std::fs::write(&temp, contents).map_err(|e| DunningError::io(&temp, e))?;
    std::fs::rename(&temp, target).map_err(|e| DunningError::io(target, e))
}
