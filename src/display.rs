//! Result panel visibility toggles

use std::fmt;
use std::str::FromStr;

/// The two result panels an operator can show or hide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultPanel {
    SingleResult,
    BatchResult,
}

impl ResultPanel {
    pub const ALL: [ResultPanel; 2] = [ResultPanel::SingleResult, ResultPanel::BatchResult];

    /// Toggle name as typed by the operator
    pub fn name(&self) -> &'static str {
        match self {
            ResultPanel::SingleResult => "showSingleResult",
            ResultPanel::BatchResult => "showBatchResult",
        }
    }
}

impl fmt::Display for ResultPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResultPanel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResultPanel::ALL
            .into_iter()
            .find(|panel| panel.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown toggle {s:?}, expected one of: {}",
                    ResultPanel::ALL.map(|p| p.name()).join(", ")
                )
            })
    }
}

/// Independent visibility flags, one per panel. All hidden initially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayToggles {
    show_single_result: bool,
    show_batch_result: bool,
}

impl DisplayToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, panel: ResultPanel) -> bool {
        match panel {
            ResultPanel::SingleResult => self.show_single_result,
            ResultPanel::BatchResult => self.show_batch_result,
        }
    }

    /// Flip one panel and return its new visibility
    pub fn toggle(&mut self, panel: ResultPanel) -> bool {
        let flag = match panel {
            ResultPanel::SingleResult => &mut self.show_single_result,
            ResultPanel::BatchResult => &mut self.show_batch_result,
        };
        *flag = !*flag;
        *flag
    }

    /// Flip a panel by its toggle name
    pub fn toggle_by_name(&mut self, name: &str) -> Result<bool, String> {
        let panel: ResultPanel = name.parse()?;
        Ok(self.toggle(panel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_are_independent() {
        let mut toggles = DisplayToggles::new();

        assert!(toggles.toggle(ResultPanel::SingleResult));
        assert!(toggles.is_visible(ResultPanel::SingleResult));
        assert!(!toggles.is_visible(ResultPanel::BatchResult));

        assert!(toggles.toggle(ResultPanel::BatchResult));
        assert!(toggles.is_visible(ResultPanel::SingleResult));
    }

    #[test]
    fn test_double_toggle_restores() {
        for panel in ResultPanel::ALL {
            let mut toggles = DisplayToggles::new();
            toggles.toggle(ResultPanel::BatchResult);
            let before = toggles;

            toggles.toggle(panel);
            toggles.toggle(panel);
            assert_eq!(toggles, before);
        }
    }

    #[test]
    fn test_toggle_by_name() {
        let mut toggles = DisplayToggles::new();
        assert_eq!(toggles.toggle_by_name("showBatchResult"), Ok(true));
        assert!(!toggles.is_visible(ResultPanel::SingleResult));

        let err = toggles.toggle_by_name("showResults").unwrap_err();
        assert!(err.contains("showSingleResult"));
        assert_eq!(toggles.toggle_by_name("showSingleResult"), Ok(true));
    }
}
