//! Multiload E2E
//!
//! Browser-side work units for the multiload runner:
//! - Parses declarative YAML flows
//! - Renders flows to Playwright scripts and runs them, one browser per run
//! - Page objects for the compare workflow
//! - Scenarios tying a work unit to a load run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Load harness (tests/load.rs)               │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario::{Encrypt, Web}                                   │
//! │    ├── CryptoLoad                (multiload-common)         │
//! │    └── CompareModelsFlow                                    │
//! │          ├── pages: HomePage, FooterMenu, CompareModelsPage │
//! │          └── PlaywrightHandle::run_flow(FlowSpec)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_load(settings, work) -> LoadReport                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod pages;
pub mod playwright;
pub mod scenario;
pub mod spec;
pub mod workflow;

pub use error::{E2eError, E2eResult};
pub use scenario::{report_passed, run_scenario, Scenario};
pub use spec::{FlowSpec, FlowStep};
pub use workflow::CompareModelsFlow;
