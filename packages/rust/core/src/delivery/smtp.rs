//! Direct delivery over SMTP with STARTTLS.

use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};
use tracing::{info, instrument};

use dunning_shared::{AppConfig, DunningError, Notice, Recipients, Result};
use dunning_storage::{PreferenceStore, keys};

use super::{Sink, build_message};
use crate::prompt::ChoiceSource;

/// Connection settings gathered at the SMTP prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub password: String,
}

impl SmtpSettings {
    /// Ask for server, port, From and password.
    ///
    /// Server and port default to `[mail]` in the config, From to the saved
    /// `default_from_email`. A From typed while none is saved is remembered.
    pub fn prompt(
        source: &mut dyn ChoiceSource,
        config: &AppConfig,
        prefs: &mut PreferenceStore,
    ) -> Result<Self> {
        source.show("");
        source.show("=== SMTP Email Setup ===");

        let host = ask_required(
            source,
            "SMTP Server (e.g., smtp.gmail.com)",
            config.mail.smtp_host.as_deref(),
        )?;
        let port = loop {
            let default = config.mail.smtp_port.to_string();
            let answer = ask_required(source, "SMTP Port", Some(&default))?;
            match answer.parse::<u16>() {
                Ok(port) if port > 0 => break port,
                _ => source.show("Please enter a valid port number"),
            }
        };

        let saved_from = prefs.get(keys::DEFAULT_FROM_EMAIL).map(str::to_string);
        let from = ask_required(source, "Your Email", saved_from.as_deref())?;
        if saved_from.is_none() {
            prefs.set(keys::DEFAULT_FROM_EMAIL, from.as_str());
        }
        let password = source.ask("Your Email Password/App Password: ")?;

        Ok(Self {
            host,
            port,
            from,
            password: password.trim().to_string(),
        })
    }
}

/// Ask until a non-blank answer, or the default when one exists.
fn ask_required(
    source: &mut dyn ChoiceSource,
    label: &str,
    default: Option<&str>,
) -> Result<String> {
    let prompt = match default {
        Some(d) => format!("{label} [{d}]: "),
        None => format!("{label}: "),
    };
    loop {
        let answer = source.ask(&prompt)?;
        let answer = answer.trim();
        match (answer.is_empty(), default) {
            (false, _) => return Ok(answer.to_string()),
            (true, Some(d)) => return Ok(d.to_string()),
            (true, None) => continue,
        }
    }
}

/// Sends every notice through one STARTTLS transport.
pub struct SmtpSink {
    transport: SmtpTransport,
    from: String,
    cc: Recipients,
}

impl SmtpSink {
    #[instrument(skip_all, fields(host = %settings.host, port = settings.port))]
    pub fn connect(settings: &SmtpSettings, cc: Recipients) -> Result<Self> {
        let transport = SmtpTransport::starttls_relay(&settings.host)
            .map_err(|e| DunningError::config(format!("smtp relay {}: {e}", settings.host)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.from.clone(),
                settings.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: settings.from.clone(),
            cc,
        })
    }
}

impl Sink for SmtpSink {
    fn name(&self) -> &str {
        "smtp"
    }

    fn deliver(
        &mut self,
        notice: &Notice,
        address: &str,
        source: &mut dyn ChoiceSource,
    ) -> Result<()> {
        let to = Recipients::parse(address);
        let message = build_message(notice, &to, &self.cc, &self.from)?;
        self.transport
            .send(&message)
            .map_err(|e| DunningError::delivery(&notice.customer, e))?;
        info!(customer = %notice.customer, "notice sent");
        source.show(&format!("Email sent to: {} ({address})", notice.customer));
        Ok(())
    }
}
