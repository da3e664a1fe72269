//! Application configuration for dunning.
//!
//! User config lives at `~/.dunning/dunning.toml`. A missing file means
//! defaults, which carry the organization's letterhead and payment details.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DunningError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "dunning.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".dunning";

// ---------------------------------------------------------------------------
// Config structs (matching dunning.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Sender organization (subject line and signature).
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// Payment instructions block.
    #[serde(default)]
    pub payment: PaymentConfig,

    /// Mail transport defaults.
    #[serde(default)]
    pub mail: MailConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Input workbook defaults.
    #[serde(default)]
    pub input: InputConfig,
}

/// `[organization]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Short name used in subject lines.
    #[serde(default = "default_org_name")]
    pub name: String,

    /// Legal name used in the signature.
    #[serde(default = "default_legal_name")]
    pub legal_name: String,

    /// Signing department.
    #[serde(default = "default_department")]
    pub department: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: default_org_name(),
            legal_name: default_legal_name(),
            department: default_department(),
        }
    }
}

fn default_org_name() -> String {
    "Rana Analytics".into()
}
fn default_legal_name() -> String {
    "Rana Analytics, LLC".into()
}
fn default_department() -> String {
    "Accounts Receivable".into()
}

/// `[payment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_bank_name")]
    pub bank_name: String,
    #[serde(default = "default_account_name")]
    pub account_name: String,
    #[serde(default = "default_routing_number")]
    pub routing_number: String,
    #[serde(default = "default_account_number")]
    pub account_number: String,
    #[serde(default = "default_account_type")]
    pub account_type: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            bank_name: default_bank_name(),
            account_name: default_account_name(),
            routing_number: default_routing_number(),
            account_number: default_account_number(),
            account_type: default_account_type(),
        }
    }
}

fn default_bank_name() -> String {
    "Texas First Bank".into()
}
fn default_account_name() -> String {
    "Rana Analytics LLC".into()
}
fn default_routing_number() -> String {
    "113110256".into()
}
fn default_account_number() -> String {
    "10420917".into()
}
fn default_account_type() -> String {
    "Checking".into()
}

/// `[mail]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Addresses copied on every notice.
    #[serde(default = "default_cc")]
    pub cc: Vec<String>,

    /// SMTP server offered as the default at the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,

    /// SMTP submission port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
        }
    }
}

fn default_cc() -> Vec<String> {
    vec![
        "executive.admin@ranaanalytics.com".into(),
        "michael.wells@ranaanalytics.com".into(),
    ]
}
fn default_smtp_port() -> u16 {
    587
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for HTML notices (relative to the working directory).
    #[serde(default = "default_output_dir")]
    pub directory: String,

    /// Subdirectory of `directory` for `.eml` drafts.
    #[serde(default = "default_drafts_subdir")]
    pub drafts_subdir: String,

    /// Suffix appended to the workbook stem for the spreadsheet export.
    #[serde(default = "default_export_suffix")]
    pub export_suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            drafts_subdir: default_drafts_subdir(),
            export_suffix: default_export_suffix(),
        }
    }
}

fn default_output_dir() -> String {
    "Customer_Emails".into()
}
fn default_drafts_subdir() -> String {
    "Outlook_Drafts_EML".into()
}
fn default_export_suffix() -> String {
    "_emails_export".into()
}

/// `[input]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Workbook offered when the path prompt is left blank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workbook: Option<String>,

    /// Sheet names (case-insensitive) auto-selected as the data sheet.
    #[serde(default = "default_data_sheets")]
    pub data_sheet_candidates: Vec<String>,

    /// Sheet names (case-insensitive) auto-selected as the emails sheet.
    #[serde(default = "default_emails_sheets")]
    pub emails_sheet_candidates: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_workbook: None,
            data_sheet_candidates: default_data_sheets(),
            emails_sheet_candidates: default_emails_sheets(),
        }
    }
}

fn default_data_sheets() -> Vec<String> {
    ["data", "sheet1", "sheet 1", "invoices", "transactions"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_emails_sheets() -> Vec<String> {
    ["emails", "email", "contacts", "customers"]
        .into_iter()
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.dunning/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| DunningError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.dunning/dunning.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DunningError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DunningError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DunningError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DunningError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DunningError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("routing_number"));
        assert!(toml_str.contains("Customer_Emails"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.organization.name, "Rana Analytics");
        assert_eq!(parsed.mail.smtp_port, 587);
        assert_eq!(parsed.mail.cc.len(), 2);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[organization]
name = "Acme Corp"

[input]
default_workbook = "/tmp/ledger.xlsx"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.organization.name, "Acme Corp");
        assert_eq!(config.organization.department, "Accounts Receivable");
        assert_eq!(config.input.default_workbook.as_deref(), Some("/tmp/ledger.xlsx"));
        assert!(config.input.data_sheet_candidates.contains(&"invoices".to_string()));
        assert_eq!(config.payment.account_type, "Checking");
    }

    #[test]
    fn load_config_from_reports_parse_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[mail\ncc = 3").expect("write");
        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
