//! Sheet-name resolution cascade.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use dunning_shared::{DunningError, Result, workbook_hints};

use crate::strategies::{
    AutoDetectEngine, DesktopAutomation, DirectContainerRead, SheetNameStrategy, WorkbookXmlParse,
    XlsEngine, XlsbEngine, XlsxEngine,
};

/// Sheet names plus the strategy that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSheets {
    pub names: Vec<String>,
    pub strategy: String,
}

/// Holds sheet-name strategies in priority order.
pub struct SheetResolver {
    strategies: Vec<Box<dyn SheetNameStrategy>>,
}

impl SheetResolver {
    /// Create a resolver with every built-in strategy.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(AutoDetectEngine),
            Box::new(XlsEngine),
            Box::new(XlsxEngine),
            Box::new(XlsbEngine),
            Box::new(DirectContainerRead),
            Box::new(DesktopAutomation),
            Box::new(WorkbookXmlParse),
        ])
    }

    /// Create a resolver with a custom strategy list.
    pub fn with_strategies(strategies: Vec<Box<dyn SheetNameStrategy>>) -> Self {
        Self { strategies }
    }

    /// Strategy names in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// List the sheets of `path`; the first strategy returning a non-empty
    /// list wins.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn resolve(&self, path: &Path) -> Result<ResolvedSheets> {
        if !path.exists() {
            return Err(DunningError::NotFound {
                path: path.to_path_buf(),
            });
        }

        for strategy in &self.strategies {
            if !strategy.applies_to(path) {
                debug!(strategy = strategy.name(), "skipped");
                continue;
            }
            match strategy.sheet_names(path) {
                Ok(names) if !names.is_empty() => {
                    info!(strategy = strategy.name(), count = names.len(), "sheets resolved");
                    return Ok(ResolvedSheets {
                        names,
                        strategy: strategy.name().to_string(),
                    });
                }
                Ok(_) => debug!(strategy = strategy.name(), "no sheets listed"),
                Err(e) => warn!(strategy = strategy.name(), error = %e, "sheet listing failed"),
            }
        }

        Err(DunningError::UnreadableWorkbook {
            path: path.to_path_buf(),
            hints: workbook_hints(),
        })
    }
}

impl Default for SheetResolver {
    fn default() -> Self {
        Self::new()
    }
}
