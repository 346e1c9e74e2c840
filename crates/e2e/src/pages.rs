//! Page objects for the phone catalogue site
//!
//! Page objects do not touch a browser. They emit [`FlowStep`]s that a
//! [`crate::playwright::PlaywrightHandle`] renders and runs.

use crate::spec::{FlowStep, WaitState};

/// Landing page
#[derive(Debug, Clone, Default)]
pub struct HomePage;

impl HomePage {
    pub const PATH: &'static str = "/";
    const LOGO: &'static str = "#logo";

    pub fn new() -> Self {
        Self
    }

    pub fn open(&self) -> FlowStep {
        FlowStep::Navigate {
            url: Self::PATH.to_string(),
            wait_for_selector: None,
        }
    }

    pub fn assert_opened(&self) -> FlowStep {
        FlowStep::Assert {
            selector: Self::LOGO.to_string(),
            visible: Some(true),
            text: None,
            text_contains: None,
            count: None,
        }
    }

    pub fn footer_menu(&self) -> FooterMenu {
        FooterMenu
    }
}

/// Footer navigation shared by every page
#[derive(Debug, Clone, Default)]
pub struct FooterMenu;

impl FooterMenu {
    const ROOT: &'static str = "#footmenu";
    const COMPARE_LINK: &'static str = "#footmenu a[href=\"compare.php3\"]";

    pub fn assert_present(&self) -> FlowStep {
        FlowStep::Wait {
            selector: Self::ROOT.to_string(),
            timeout_ms: None,
            state: WaitState::Visible,
        }
    }

    /// Click through to the compare page
    pub fn open_compare_page(&self) -> (Vec<FlowStep>, CompareModelsPage) {
        let page = CompareModelsPage;
        let steps = vec![
            FlowStep::Click {
                selector: Self::COMPARE_LINK.to_string(),
                timeout_ms: None,
            },
            page.assert_opened(),
        ];
        (steps, page)
    }
}

/// Side-by-side comparison of up to three models
#[derive(Debug, Clone, Default)]
pub struct CompareModelsPage;

impl CompareModelsPage {
    pub const MAX_MODELS: usize = 3;
    const SEARCH_INPUT: &'static str = "#sSearch";
    const RESULTS: &'static str = ".autocomplete-search a";

    pub fn assert_opened(&self) -> FlowStep {
        FlowStep::Wait {
            selector: format!("{}1", Self::SEARCH_INPUT),
            timeout_ms: None,
            state: WaitState::Visible,
        }
    }

    /// Search each model into its own column; column numbers start at 1
    pub fn compare_models(&self, models: &[&str]) -> (Vec<FlowStep>, Vec<ModelSpecs>) {
        let mut steps = Vec::new();
        let mut specs = Vec::new();

        for (i, model) in models.iter().take(Self::MAX_MODELS).enumerate() {
            let column = i + 1;
            steps.push(FlowStep::Fill {
                selector: format!("{}{}", Self::SEARCH_INPUT, column),
                value: model.to_string(),
            });
            steps.push(FlowStep::Click {
                selector: format!("{}:text-is({})", Self::RESULTS, css_str(model)),
                timeout_ms: None,
            });
            specs.push(ModelSpecs { column });
        }

        (steps, specs)
    }
}

/// Rows of the comparison table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecType {
    Technology,
    Announced,
    Status,
    Dimensions,
    Weight,
    Chipset,
}

impl SpecType {
    /// Row label as shown on the page
    pub fn label(&self) -> &'static str {
        match self {
            SpecType::Technology => "Technology",
            SpecType::Announced => "Announced",
            SpecType::Status => "Status",
            SpecType::Dimensions => "Dimensions",
            SpecType::Weight => "Weight",
            SpecType::Chipset => "Chipset",
        }
    }
}

/// One model's column in the comparison table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpecs {
    column: usize,
}

impl ModelSpecs {
    pub fn column(&self) -> usize {
        self.column
    }

    /// Selector of this model's cell in the given row
    pub fn spec_selector(&self, spec: SpecType) -> String {
        format!(
            "xpath=//tr[.//*[normalize-space()='{}']]/td[contains(@class,'nfo')][{}]",
            spec.label(),
            self.column
        )
    }

    pub fn assert_spec(&self, spec: SpecType, expected: &str) -> FlowStep {
        FlowStep::Assert {
            selector: self.spec_selector(spec),
            visible: None,
            text: None,
            text_contains: Some(expected.to_string()),
            count: None,
        }
    }
}

fn css_str(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_caps_at_three_columns() {
        let (steps, specs) = CompareModelsPage.compare_models(&["a", "b", "c", "d"]);
        assert_eq!(specs.len(), 3);
        assert_eq!(steps.len(), 6);
        assert_eq!(specs[2].column(), 3);
        assert_eq!(
            steps[4],
            FlowStep::Fill {
                selector: "#sSearch3".to_string(),
                value: "c".to_string(),
            }
        );
    }

    #[test]
    fn test_result_selector_is_exact_text() {
        let (steps, _) = CompareModelsPage.compare_models(&["Samsung Galaxy J3"]);
        assert_eq!(
            steps[1],
            FlowStep::Click {
                selector: ".autocomplete-search a:text-is(\"Samsung Galaxy J3\")".to_string(),
                timeout_ms: None,
            }
        );
    }

    #[test]
    fn test_spec_selector_targets_column() {
        let specs = ModelSpecs { column: 2 };
        let selector = specs.spec_selector(SpecType::Announced);
        assert!(selector.contains("normalize-space()='Announced'"));
        assert!(selector.ends_with("[2]"));
    }

    #[test]
    fn test_footer_leads_to_compare_page() {
        let (steps, _page) = HomePage::new().footer_menu().open_compare_page();
        assert!(matches!(
            &steps[0],
            FlowStep::Click { selector, .. } if selector.contains("compare.php3")
        ));
        assert!(matches!(&steps[1], FlowStep::Wait { selector, .. } if selector == "#sSearch1"));
    }
}
