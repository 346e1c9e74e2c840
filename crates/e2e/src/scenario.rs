//! Load scenarios: which work unit each worker repeats

use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use multiload_common::{run_load, CryptoLoad, LoadConfig, LoadOutcome, LoadReport, WorkUnit};

use crate::error::E2eResult;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle};
use crate::spec::FlowSpec;
use crate::workflow::CompareModelsFlow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Key generation and block encryption
    Encrypt,
    /// Browser compare flow
    Web,
}

impl Scenario {
    /// Build the work unit for this scenario.
    ///
    /// `flow` replaces the built-in browser flow with one loaded from YAML.
    pub fn work_unit(
        &self,
        config: &LoadConfig,
        flow: Option<&Path>,
    ) -> E2eResult<Arc<dyn WorkUnit>> {
        match self {
            Scenario::Encrypt => {
                let key_length = config.crypto.key_length()?;
                info!("Crypto load with {}-bit keys", key_length.bits());
                Ok(Arc::new(CryptoLoad::new(key_length)))
            }
            Scenario::Web => {
                let handle = PlaywrightHandle::new(PlaywrightConfig::try_from(&config.web)?)?;
                let work = match flow {
                    Some(path) => CompareModelsFlow::from_spec(handle, FlowSpec::from_file(path)?),
                    None => CompareModelsFlow::new(handle),
                };
                info!(flow = %work.spec().name, steps = work.spec().steps.len(), "Browser load");
                Ok(Arc::new(work))
            }
        }
    }
}

/// Load settings, build the work unit and run the load.
///
/// Setup errors are returned before any worker starts; the run itself always
/// yields a report.
pub async fn run_scenario(
    scenario: Scenario,
    config: &LoadConfig,
    flow: Option<&Path>,
) -> E2eResult<LoadReport> {
    let settings = config.settings()?;
    let work = scenario.work_unit(config, flow)?;
    Ok(run_load(settings, work).await)
}

/// Whether a report counts as a pass
pub fn report_passed(report: &LoadReport, fail_on_timeout: bool) -> bool {
    match report.outcome {
        LoadOutcome::Completed => true,
        LoadOutcome::TimedOut { .. } => !fail_on_timeout,
        LoadOutcome::WorkerFailures { .. } => false,
    }
}
