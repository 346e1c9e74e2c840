//! Playwright browser automation
//!
//! A flow is rendered to a standalone Node script and run with `node`. Every
//! run launches and closes its own browser, so concurrent workers never share
//! a browser session. Runs are synchronous: they execute on load worker
//! threads, not on the async runtime.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::time::Instant;

use multiload_common::config::WebConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::spec::{FlowSpec, FlowStep, Viewport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::Playwright(format!("Unknown browser: {}", other))),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    /// Exported as `NODE_PATH` so the script can `require('playwright')`
    pub node_path: Option<PathBuf>,
    /// Default timeout for waits, clicks and assertions
    pub step_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gsmarena.com".to_string(),
            browser: Browser::Chromium,
            headless: true,
            node_path: None,
            step_timeout_ms: 10_000,
        }
    }
}

impl<'a> TryFrom<&'a WebConfig> for PlaywrightConfig {
    type Error = E2eError;

    fn try_from(web: &'a WebConfig) -> E2eResult<Self> {
        Ok(Self {
            base_url: web.base_url.trim_end_matches('/').to_string(),
            browser: web.browser.parse()?,
            headless: web.headless,
            node_path: web.node_path.clone(),
            step_timeout_ms: web.step_timeout_ms,
        })
    }
}

/// Result of running one flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub failed_step: Option<String>,
    pub error: Option<String>,
}

/// Status line printed by the generated script
#[derive(Debug, Deserialize)]
struct ScriptStatus {
    success: bool,
    #[serde(default)]
    step: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Playwright browser handle
#[derive(Debug, Clone)]
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

impl PlaywrightHandle {
    /// Create a handle after checking that Playwright is installed
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        Ok(Self::unchecked(config))
    }

    /// Create a handle without probing for Playwright
    pub fn unchecked(config: PlaywrightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run a flow in a fresh browser.
    ///
    /// A failing step is an `Ok` result with `success == false`; `Err` means
    /// the script could not be run at all.
    pub fn run_flow(&self, spec: &FlowSpec) -> E2eResult<FlowResult> {
        let start = Instant::now();
        let script = self.build_script(&spec.steps, spec.viewport);

        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("flow.js");
        std::fs::write(&script_path, script)?;

        debug!(flow = %spec.name, "Running Playwright script: {}", script_path.display());

        let mut cmd = Command::new("node");
        cmd.arg(&script_path).current_dir(temp_dir.path());
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }
        let output = cmd.output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let status = parse_status(&stdout).or_else(|| parse_status(&stderr));

        let duration_ms = start.elapsed().as_millis() as u64;

        match status {
            Some(status) => Ok(FlowResult {
                name: spec.name.clone(),
                success: status.success && output.status.success(),
                duration_ms,
                failed_step: status.step,
                error: status.error,
            }),
            None => Err(E2eError::Playwright(format!(
                "Script produced no status:\nstdout: {}\nstderr: {}",
                stdout, stderr
            ))),
        }
    }

    /// Run a flow and turn a failed step into an error
    pub fn run_flow_checked(&self, spec: &FlowSpec) -> E2eResult<FlowResult> {
        let result = self.run_flow(spec)?;
        if result.success {
            return Ok(result);
        }
        let reason = result.error.clone().unwrap_or_else(|| "unknown error".to_string());
        match &result.failed_step {
            Some(step) if step.starts_with("assert:") => {
                Err(E2eError::AssertionFailed(format!("{} - {}", step, reason)))
            }
            Some(step) => Err(E2eError::StepFailed {
                step: step.clone(),
                reason,
            }),
            None => Err(E2eError::Playwright(reason)),
        }
    }

    /// Build the Node script for a list of steps
    pub fn build_script(&self, steps: &[FlowStep], viewport: Viewport) -> String {
        let mut script = String::new();

        script.push_str(&format!(
            r#"const {{ {browser} }} = require('playwright');
const {{ expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  const baseUrl = {base_url};
  let currentStep = null;

  try {{
"#,
            browser = self.config.browser.as_str(),
            headless = self.config.headless,
            width = viewport.width,
            height = viewport.height,
            timeout = self.config.step_timeout_ms,
            base_url = js_str(&self.config.base_url),
        ));

        for step in steps {
            script.push_str(&format!("\n    currentStep = {};\n", js_str(&step.label())));
            script.push_str(&self.step_to_js(step));
            script.push('\n');
        }

        script.push_str(
            r#"
    console.log(JSON.stringify({ success: true }));
  } catch (error) {
    console.error(JSON.stringify({ success: false, step: currentStep, error: error.message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
        );

        script
    }

    fn step_to_js(&self, step: &FlowStep) -> String {
        let timeout = self.config.step_timeout_ms;
        match step {
            FlowStep::Navigate {
                url,
                wait_for_selector,
            } => {
                let target = if url.starts_with("http://") || url.starts_with("https://") {
                    js_str(url)
                } else {
                    format!("baseUrl + {}", js_str(url))
                };
                let wait = wait_for_selector
                    .as_ref()
                    .map(|s| format!("\n    await page.waitForSelector({});", js_str(s)))
                    .unwrap_or_default();
                format!("    await page.goto({});{}", target, wait)
            }
            FlowStep::Click {
                selector,
                timeout_ms,
            } => format!(
                "    await page.click({}, {{ timeout: {} }});",
                js_str(selector),
                timeout_ms.unwrap_or(timeout)
            ),
            FlowStep::Fill { selector, value } => {
                format!("    await page.fill({}, {});", js_str(selector), js_str(value))
            }
            FlowStep::Press { selector, key } => match selector {
                Some(sel) => format!(
                    "    await page.locator({}).press({});",
                    js_str(sel),
                    js_str(key)
                ),
                None => format!("    await page.keyboard.press({});", js_str(key)),
            },
            FlowStep::Wait {
                selector,
                timeout_ms,
                state,
            } => format!(
                "    await page.waitForSelector({}, {{ state: '{}', timeout: {} }});",
                js_str(selector),
                state.as_str(),
                timeout_ms.unwrap_or(timeout)
            ),
            FlowStep::Sleep { ms } => format!("    await page.waitForTimeout({});", ms),
            FlowStep::Assert {
                selector,
                visible,
                text,
                text_contains,
                count,
            } => {
                let locator = format!("page.locator({})", js_str(selector));
                let mut assertions = Vec::new();

                match visible {
                    Some(true) => assertions.push(format!(
                        "    await expect({}).toBeVisible({{ timeout: {} }});",
                        locator, timeout
                    )),
                    Some(false) => assertions.push(format!(
                        "    await expect({}).toBeHidden({{ timeout: {} }});",
                        locator, timeout
                    )),
                    None => {}
                }
                if let Some(t) = text {
                    assertions.push(format!(
                        "    await expect({}).toHaveText({}, {{ timeout: {} }});",
                        locator,
                        js_str(t),
                        timeout
                    ));
                }
                if let Some(t) = text_contains {
                    assertions.push(format!(
                        "    await expect({}).toContainText({}, {{ timeout: {} }});",
                        locator,
                        js_str(t),
                        timeout
                    ));
                }
                if let Some(c) = count {
                    assertions.push(format!(
                        "    await expect({}).toHaveCount({}, {{ timeout: {} }});",
                        locator, c, timeout
                    ));
                }

                assertions.join("\n")
            }
            FlowStep::Log { message } => {
                format!("    console.log('[FLOW] ' + {});", js_str(message))
            }
        }
    }
}

/// Quote a string as a JavaScript literal
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Last JSON status line in the script output
fn parse_status(output: &str) -> Option<ScriptStatus> {
    output
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<ScriptStatus>(line.trim()).ok())
}
