//! Desktop-suite automation: ask an installed Excel for the sheet names.
//!
//! Only attempted on Windows, where Excel exposes COM automation. The query
//! runs in a PowerShell subprocess so no COM bindings are linked in.

use std::path::Path;
use std::process::Command;

use dunning_shared::{DunningError, Result};

use super::{SheetNameStrategy, Strategy};

/// Lists sheets through Excel COM automation.
pub struct DesktopAutomation;

impl DesktopAutomation {
    fn script(path: &Path) -> String {
        // Single quotes inside a PowerShell literal are escaped by doubling.
        let literal = path.to_string_lossy().replace('\'', "''");
        format!(
            "$ErrorActionPreference = 'Stop'\n\
             $excel = New-Object -ComObject Excel.Application\n\
             $excel.Visible = $false\n\
             $excel.DisplayAlerts = $false\n\
             try {{\n\
               $wb = $excel.Workbooks.Open('{literal}', 0, $true)\n\
               foreach ($s in $wb.Sheets) {{ Write-Output $s.Name }}\n\
               $wb.Close($false)\n\
             }} finally {{ $excel.Quit() }}"
        )
    }
}

impl Strategy for DesktopAutomation {
    fn name(&self) -> &str {
        "desktop-automation"
    }

    fn applies_to(&self, _path: &Path) -> bool {
        cfg!(windows)
    }
}

impl SheetNameStrategy for DesktopAutomation {
    fn sheet_names(&self, path: &Path) -> Result<Vec<String>> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(Self::script(path))
            .output()
            .map_err(|e| DunningError::strategy(self.name(), format!("failed to spawn powershell: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DunningError::strategy(
                self.name(),
                format!("excel automation exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }
}
