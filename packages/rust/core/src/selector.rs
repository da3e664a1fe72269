//! Column and sheet selection.
//!
//! Columns map to semantic roles (customer name, email address). A saved
//! preference naming a column that exists in the current list is trusted
//! without prompting; otherwise the user picks from a numbered menu and the
//! choice is saved under the role's key.

use tracing::{debug, info};

use dunning_shared::Result;
use dunning_storage::{PreferenceStore, keys};

use crate::prompt::{ChoiceSource, choose_index};

/// A semantic column role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRole {
    /// Shown in prompts ("customer names").
    pub label: &'static str,
    /// Preference key the choice is remembered under.
    pub pref_key: Option<&'static str>,
    /// Whether a "Skip" entry is offered.
    pub optional: bool,
}

/// Customer column of the data sheet.
pub const MAIN_CUSTOMER: ColumnRole = ColumnRole {
    label: "customer names",
    pref_key: Some(keys::MAIN_CUSTOMER_COLUMN),
    optional: false,
};

/// Customer column of the emails sheet.
pub const EMAILS_CUSTOMER: ColumnRole = ColumnRole {
    label: "customer names",
    pref_key: Some(keys::EMAILS_CUSTOMER_COLUMN),
    optional: false,
};

/// Address column of the emails sheet.
pub const EMAILS_ADDRESS: ColumnRole = ColumnRole {
    label: "email addresses",
    pref_key: Some(keys::EMAILS_EMAIL_COLUMN),
    optional: false,
};

/// Pick the column for `role` from `columns`.
///
/// Returns `None` only for an optional role whose skip entry was chosen.
pub fn select_column(
    source: &mut dyn ChoiceSource,
    prefs: &mut PreferenceStore,
    columns: &[String],
    role: &ColumnRole,
) -> Result<Option<String>> {
    if let Some(key) = role.pref_key {
        if let Some(saved) = prefs.get(key) {
            if columns.iter().any(|c| c == saved) {
                info!(key, column = saved, "using saved column choice");
                source.show(&format!("Using saved choice for {}: {saved}", role.label));
                return Ok(Some(saved.to_string()));
            }
            debug!(key, column = saved, "saved column not in sheet, asking");
        }
    }

    let title = format!("Please choose which column contains {}:", role.label);
    let skip = role.optional.then(|| format!("Skip (no {} column)", role.label));
    let Some(index) = choose_index(source, &title, columns, skip.as_deref())? else {
        return Ok(None);
    };

    let chosen = columns[index].clone();
    if let Some(key) = role.pref_key {
        prefs.set(key, chosen.as_str());
    }
    Ok(Some(chosen))
}

/// Pick a sheet by name.
///
/// The first of `candidates` matching a sheet name case-insensitively is
/// taken without prompting. Otherwise the user chooses; with `optional`, a
/// "Skip" entry returns `None`.
pub fn choose_sheet(
    source: &mut dyn ChoiceSource,
    sheets: &[String],
    kind: &str,
    candidates: &[String],
    optional: bool,
) -> Result<Option<String>> {
    if let Some(found) = auto_select_sheet(sheets, candidates) {
        info!(kind, sheet = found, "sheet auto-selected");
        return Ok(Some(found.to_string()));
    }

    let title = format!("Please choose which sheet contains your {kind}:");
    let skip = optional.then(|| format!("Skip (no {kind} sheet)"));
    let index = choose_index(source, &title, sheets, skip.as_deref())?;
    Ok(index.map(|i| sheets[i].clone()))
}

/// First candidate (in candidate order) naming one of `sheets`, ignoring case.
pub fn auto_select_sheet<'a>(sheets: &'a [String], candidates: &[String]) -> Option<&'a str> {
    candidates.iter().find_map(|candidate| {
        let candidate = candidate.to_lowercase();
        sheets
            .iter()
            .find(|s| s.to_lowercase() == candidate)
            .map(String::as_str)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedChoices;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn temp_prefs() -> (tempfile::TempDir, PreferenceStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = PreferenceStore::open_at(dir.path().join("prefs.json"), None);
        (dir, prefs)
    }

    #[test]
    fn saved_preference_round_trip_skips_prompt() {
        let (dir, mut prefs) = temp_prefs();
        let cols = columns(&["Invoice", "Customer", "Amount"]);

        let mut first = ScriptedChoices::new(["2"]);
        let chosen = select_column(&mut first, &mut prefs, &cols, &MAIN_CUSTOMER).expect("select");
        assert_eq!(chosen.as_deref(), Some("Customer"));

        let mut reloaded = PreferenceStore::open_at(dir.path().join("prefs.json"), None);
        let mut second = ScriptedChoices::new(Vec::<String>::new());
        let chosen =
            select_column(&mut second, &mut reloaded, &cols, &MAIN_CUSTOMER).expect("select");
        assert_eq!(chosen.as_deref(), Some("Customer"));
        assert!(second.asked.is_empty());
    }

    #[test]
    fn stale_preference_prompts_again() {
        let (_dir, mut prefs) = temp_prefs();
        prefs.set(keys::MAIN_CUSTOMER_COLUMN, "Client");
        let cols = columns(&["Customer", "Amount"]);

        let mut source = ScriptedChoices::new(["x", "5", "1"]);
        let chosen = select_column(&mut source, &mut prefs, &cols, &MAIN_CUSTOMER).expect("select");
        assert_eq!(chosen.as_deref(), Some("Customer"));
        assert_eq!(prefs.get(keys::MAIN_CUSTOMER_COLUMN), Some("Customer"));
        assert_eq!(source.asked.len(), 3);
    }

    #[test]
    fn optional_role_can_be_skipped() {
        let (_dir, mut prefs) = temp_prefs();
        let role = ColumnRole {
            label: "notes",
            pref_key: None,
            optional: true,
        };
        let mut source = ScriptedChoices::new(["3"]);
        let chosen =
            select_column(&mut source, &mut prefs, &columns(&["A", "B"]), &role).expect("select");
        assert_eq!(chosen, None);
        assert!(prefs.is_empty());
    }

    #[test]
    fn sheet_candidates_are_case_insensitive_and_ordered() {
        let sheets = columns(&["Contacts", "SHEET1", "Data"]);
        let data = columns(&["data", "sheet1"]);
        assert_eq!(auto_select_sheet(&sheets, &data), Some("Data"));
        let emails = columns(&["emails", "contacts"]);
        assert_eq!(auto_select_sheet(&sheets, &emails), Some("Contacts"));
        assert_eq!(auto_select_sheet(&sheets, &columns(&["ledger"])), None);
    }

    #[test]
    fn optional_sheet_prompt_offers_skip() {
        let sheets = columns(&["Ledger", "People"]);
        let mut source = ScriptedChoices::new(["3"]);
        let chosen = choose_sheet(&mut source, &sheets, "emails", &[], true).expect("choose");
        assert_eq!(chosen, None);
        assert!(source.saw("Skip (no emails sheet)"));

        let mut source = ScriptedChoices::new(["1"]);
        let chosen = choose_sheet(&mut source, &sheets, "data", &[], false).expect("choose");
        assert_eq!(chosen.as_deref(), Some("Ledger"));
    }
}
