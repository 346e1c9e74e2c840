//! Browser workflow as a load work unit

use multiload_common::WorkUnit;

use crate::error::E2eResult;
use crate::pages::{HomePage, SpecType};
use crate::playwright::{FlowResult, PlaywrightHandle};
use crate::spec::{FlowSpec, FlowStep, Viewport};

/// A model to compare and its expected announcement date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelExpectation {
    pub model: String,
    pub announced: String,
}

impl ModelExpectation {
    pub fn new(model: &str, announced: &str) -> Self {
        Self {
            model: model.to_string(),
            announced: announced.to_string(),
        }
    }
}

/// Models compared by the default flow
pub fn default_expectations() -> Vec<ModelExpectation> {
    vec![
        ModelExpectation::new("Samsung Galaxy J3", "2015, November"),
        ModelExpectation::new("Samsung Galaxy J5", "2015, June"),
        ModelExpectation::new("Samsung Galaxy J7 Pro", "2017, June"),
    ]
}

/// Build the compare flow: open home, check footer, compare models, check
/// each model's announcement date
pub fn compare_models_flow(expectations: &[ModelExpectation]) -> FlowSpec {
    let home = HomePage::new();
    let footer = home.footer_menu();

    let mut steps: Vec<FlowStep> = vec![home.open(), home.assert_opened(), footer.assert_present()];

    let (open_steps, compare_page) = footer.open_compare_page();
    steps.extend(open_steps);

    let models: Vec<&str> = expectations.iter().map(|e| e.model.as_str()).collect();
    let (compare_steps, specs) = compare_page.compare_models(&models);
    steps.extend(compare_steps);

    for (spec, expected) in specs.iter().zip(expectations) {
        steps.push(spec.assert_spec(SpecType::Announced, &expected.announced));
    }

    FlowSpec {
        name: "compare-models".to_string(),
        description: "Compare models from the footer menu and check announcement dates".to_string(),
        tags: vec!["load".to_string()],
        viewport: Viewport::default(),
        steps,
    }
}

/// Runs one browser flow per iteration
#[derive(Debug, Clone)]
pub struct CompareModelsFlow {
    handle: PlaywrightHandle,
    spec: FlowSpec,
}

impl CompareModelsFlow {
    /// The built-in compare flow
    pub fn new(handle: PlaywrightHandle) -> Self {
        Self::from_spec(handle, compare_models_flow(&default_expectations()))
    }

    /// Any flow loaded from YAML
    pub fn from_spec(handle: PlaywrightHandle, spec: FlowSpec) -> Self {
        Self { handle, spec }
    }

    pub fn spec(&self) -> &FlowSpec {
        &self.spec
    }

    pub fn run(&self) -> E2eResult<FlowResult> {
        self.handle.run_flow_checked(&self.spec)
    }
}

impl WorkUnit for CompareModelsFlow {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn execute(&self) -> multiload_common::Result<()> {
        self.run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flow_shape() {
        let flow = compare_models_flow(&default_expectations());
        assert_eq!(flow.name, "compare-models");

        // open, opened, footer, click, compare page + 3 * (fill, click) + 3 asserts
        assert_eq!(flow.steps.len(), 3 + 2 + 6 + 3);
        assert!(matches!(&flow.steps[0], FlowStep::Navigate { url, .. } if url == "/"));

        let announced: Vec<&str> = flow
            .steps
            .iter()
            .filter_map(|s| match s {
                FlowStep::Assert {
                    text_contains: Some(t),
                    ..
                } => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(announced, vec!["2015, November", "2015, June", "2017, June"]);
    }

    #[test]
    fn test_work_unit_named_after_flow() {
        let flow = CompareModelsFlow::new(PlaywrightHandle::unchecked(Default::default()));
        assert_eq!(flow.name(), "compare-models");
    }
}
