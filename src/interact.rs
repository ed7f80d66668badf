//! Wait-qualified element interaction.
//!
//! Every element access funnels through a fixed-interval poll that re-resolves
//! its locator from scratch on each iteration, so timing races between page
//! rendering and test execution surface as a bounded wait instead of a flaky
//! failure, and no stale handle survives a DOM swap. On timeout the layer
//! captures a screenshot, emits one ERROR record, and returns a structured
//! [`InteractionError`]; raw backend errors never cross this boundary
//! unwrapped.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tokio::time::{self, Instant};

use crate::artifacts::ArtifactStore;
use crate::config::ProsceniumConfig;
use crate::driver::{DriverError, DriverSession, ElementId, ScriptArg};
use crate::locator::Locator;
use crate::logging::HarnessLogger;

const JS_CLICK: &str = "arguments[0].click();";

/// Condition an element must satisfy before an operation proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    Present,
    Visible,
    Clickable,
    Invisible,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitCondition::Present => "present",
            WaitCondition::Visible => "visible",
            WaitCondition::Clickable => "clickable",
            WaitCondition::Invisible => "invisible",
        };
        f.write_str(name)
    }
}

/// How long and how often to re-query the page before declaring failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn from_config(config: &ProsceniumConfig) -> Self {
        Self {
            timeout: config.explicit_wait(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Diagnosis of a wait that ran out of time.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureRecord {
    pub locator: Locator,
    pub condition: WaitCondition,
    pub elapsed: Duration,
    pub screenshot: Option<PathBuf>,
}

impl fmt::Display for FailureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "waited {:?} for {} to become {}",
            self.elapsed, self.locator, self.condition
        )?;
        if let Some(path) = &self.screenshot {
            write!(f, "; screenshot: {}", path.display())?;
        }
        Ok(())
    }
}

/// Failures surfaced by the interaction layer.
#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("element not ready: {0}")]
    ElementNotReady(FailureRecord),
    #[error("interaction blocked on {locator}: {reason}")]
    InteractionBlocked { locator: Locator, reason: String },
    #[error("page did not finish loading within {elapsed:?}")]
    PageLoadTimeout { elapsed: Duration },
    #[error("script execution failed: {0}")]
    Script(String),
    #[error(transparent)]
    Driver(#[from] DriverError),
}

enum Probe {
    Satisfied(Option<ElementId>),
    Pending,
}

/// Wait-qualified operations over one driver session.
///
/// Stateless beyond the session handle; a clone per worker is safe because no
/// mutable state is shared.
#[derive(Clone)]
pub struct Interactor {
    driver: Arc<dyn DriverSession>,
    policy: WaitPolicy,
    logger: Arc<HarnessLogger>,
    artifacts: ArtifactStore,
    screenshot_on_failure: bool,
}

impl Interactor {
    pub fn new(
        driver: Arc<dyn DriverSession>,
        config: &ProsceniumConfig,
        logger: Arc<HarnessLogger>,
    ) -> Self {
        Self {
            driver,
            policy: WaitPolicy::from_config(config),
            logger,
            artifacts: ArtifactStore::new(&config.screenshots_path),
            screenshot_on_failure: config.screenshot_on_failure,
        }
    }

    pub fn driver(&self) -> &Arc<dyn DriverSession> {
        &self.driver
    }

    pub fn logger(&self) -> &Arc<HarnessLogger> {
        &self.logger
    }

    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Navigate the session to an absolute URL.
    pub async fn goto(&self, url: &str) -> Result<(), InteractionError> {
        self.logger.info(format!("Opening URL: {url}"), Some("navigate"));
        self.driver.goto(url).await.map_err(InteractionError::from)
    }

    pub async fn current_url(&self) -> Result<String, InteractionError> {
        self.driver.current_url().await.map_err(InteractionError::from)
    }

    pub async fn title(&self) -> Result<String, InteractionError> {
        self.driver.title().await.map_err(InteractionError::from)
    }

    /// Poll until `condition` holds for `locator` or the configured timeout
    /// elapses.
    ///
    /// Returns `Some(element)` for the element-yielding conditions and `None`
    /// once an `Invisible` wait is satisfied. Failure is declared no earlier
    /// than the timeout and no later than one poll interval past it.
    pub async fn wait_for(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> Result<Option<ElementId>, InteractionError> {
        self.wait_for_with(locator, condition, self.policy.timeout).await
    }

    /// [`Interactor::wait_for`] with a per-call timeout override.
    pub async fn wait_for_with(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<Option<ElementId>, InteractionError> {
        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            if let Probe::Satisfied(element) = self.probe(locator, condition).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                break;
            }
            time::sleep(self.policy.poll_interval).await;
        }

        let elapsed = started.elapsed();
        let screenshot = self
            .capture_failure(&format!("element_not_found_{}", locator.slug()))
            .await;
        let record = FailureRecord {
            locator: locator.clone(),
            condition,
            elapsed,
            screenshot,
        };
        self.logger.error(record.to_string(), Some("wait"));
        Err(InteractionError::ElementNotReady(record))
    }

    pub async fn wait_for_present(&self, locator: &Locator) -> Result<ElementId, InteractionError> {
        self.require(locator, WaitCondition::Present, self.policy.timeout)
            .await
    }

    pub async fn wait_for_visible(&self, locator: &Locator) -> Result<ElementId, InteractionError> {
        self.require(locator, WaitCondition::Visible, self.policy.timeout)
            .await
    }

    pub async fn wait_for_clickable(
        &self,
        locator: &Locator,
    ) -> Result<ElementId, InteractionError> {
        self.require(locator, WaitCondition::Clickable, self.policy.timeout)
            .await
    }

    /// Wait until the locator matches nothing, or matches only hidden nodes.
    pub async fn wait_for_invisible(&self, locator: &Locator) -> Result<(), InteractionError> {
        self.wait_for_with(locator, WaitCondition::Invisible, self.policy.timeout)
            .await
            .map(|_| ())
    }

    async fn require(
        &self,
        locator: &Locator,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<ElementId, InteractionError> {
        match self.wait_for_with(locator, condition, timeout).await? {
            Some(element) => Ok(element),
            None => unreachable!("element-yielding conditions always resolve to a handle"),
        }
    }

    /// Click the first element matching `locator` once it is clickable.
    ///
    /// When the native click is rejected as intercepted (an overlay or
    /// animation covering the target), the click is retried exactly once as a
    /// script click on the same resolved element.
    pub async fn click(&self, locator: &Locator) -> Result<(), InteractionError> {
        let element = self.wait_for_clickable(locator).await?;
        match self.driver.click(&element).await {
            Ok(()) => Ok(()),
            Err(DriverError::ClickIntercepted(reason)) => {
                self.logger.debug(
                    format!("native click on {locator} intercepted, retrying via script: {reason}"),
                    Some("interact"),
                );
                match self
                    .driver
                    .execute_script(JS_CLICK, vec![ScriptArg::Element(element)])
                    .await
                {
                    Ok(_) => Ok(()),
                    Err(err) => {
                        let reason = err.to_string();
                        self.logger.error(
                            format!("click blocked on {locator}: {reason}"),
                            Some("interact"),
                        );
                        Err(InteractionError::InteractionBlocked {
                            locator: locator.clone(),
                            reason,
                        })
                    }
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Read the rendered text of the first visible match.
    pub async fn read_text(&self, locator: &Locator) -> Result<String, InteractionError> {
        let element = self.wait_for_visible(locator).await?;
        self.driver.text(&element).await.map_err(InteractionError::from)
    }

    /// Read an attribute of the first visible match.
    pub async fn read_attribute(
        &self,
        locator: &Locator,
        name: &str,
    ) -> Result<Option<String>, InteractionError> {
        let element = self.wait_for_visible(locator).await?;
        self.driver
            .attribute(&element, name)
            .await
            .map_err(InteractionError::from)
    }

    /// Clear the first visible match and type `text` into it.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), InteractionError> {
        let element = self.wait_for_visible(locator).await?;
        self.driver.clear(&element).await?;
        self.driver.send_keys(&element, text).await?;
        Ok(())
    }

    /// Run a script in the page. Engine-level failures come back as
    /// [`InteractionError::Script`].
    pub async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg>,
    ) -> Result<JsonValue, InteractionError> {
        self.driver
            .execute_script(script, args)
            .await
            .map_err(|err| InteractionError::Script(err.to_string()))
    }

    /// Immediate presence probe, no waiting.
    pub async fn is_present(&self, locator: &Locator) -> bool {
        matches!(self.driver.find(locator).await, Ok(Some(_)))
    }

    /// Immediate visibility probe, no waiting.
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        match self.driver.find(locator).await {
            Ok(Some(element)) => self.driver.is_displayed(&element).await.unwrap_or(false),
            _ => false,
        }
    }

    /// Capture a screenshot unconditionally, e.g. for page-level evidence.
    pub async fn screenshot(&self, name: &str) -> Result<PathBuf, InteractionError> {
        self.artifacts
            .capture(&self.driver, name)
            .await
            .map_err(InteractionError::from)
    }

    /// Capture a failure screenshot if enabled, returning the written path.
    ///
    /// Capture problems are logged and swallowed: evidence collection must
    /// not mask the failure being evidenced.
    pub async fn capture_failure(&self, name: &str) -> Option<PathBuf> {
        if !self.screenshot_on_failure {
            return None;
        }
        match self.artifacts.capture(&self.driver, name).await {
            Ok(path) => {
                self.logger.debug(
                    format!("saved failure screenshot to {}", path.display()),
                    Some("artifacts"),
                );
                Some(path)
            }
            Err(err) => {
                self.logger.error(
                    format!("failed to capture screenshot '{name}': {err}"),
                    Some("artifacts"),
                );
                None
            }
        }
    }

    async fn probe(
        &self,
        locator: &Locator,
        condition: WaitCondition,
    ) -> Result<Probe, InteractionError> {
        let element = match self.driver.find(locator).await {
            Ok(element) => element,
            // A node replaced mid-probe just means "not there yet".
            Err(err) if is_transient(&err) => None,
            Err(err) => return Err(err.into()),
        };

        match condition {
            WaitCondition::Present => Ok(match element {
                Some(el) => Probe::Satisfied(Some(el)),
                None => Probe::Pending,
            }),
            WaitCondition::Visible | WaitCondition::Clickable => {
                let Some(el) = element else {
                    return Ok(Probe::Pending);
                };
                let displayed = match self.driver.is_displayed(&el).await {
                    Ok(displayed) => displayed,
                    Err(err) if is_transient(&err) => return Ok(Probe::Pending),
                    Err(err) => return Err(err.into()),
                };
                if !displayed {
                    return Ok(Probe::Pending);
                }
                if condition == WaitCondition::Clickable {
                    let enabled = match self.driver.is_enabled(&el).await {
                        Ok(enabled) => enabled,
                        Err(err) if is_transient(&err) => return Ok(Probe::Pending),
                        Err(err) => return Err(err.into()),
                    };
                    if !enabled {
                        return Ok(Probe::Pending);
                    }
                }
                Ok(Probe::Satisfied(Some(el)))
            }
            WaitCondition::Invisible => match element {
                None => Ok(Probe::Satisfied(None)),
                Some(el) => match self.driver.is_displayed(&el).await {
                    Ok(true) => Ok(Probe::Pending),
                    Ok(false) => Ok(Probe::Satisfied(None)),
                    // Vanished between find and the check: that is invisible.
                    Err(err) if is_transient(&err) => Ok(Probe::Satisfied(None)),
                    Err(err) => Err(err.into()),
                },
            },
        }
    }
}

fn is_transient(err: &DriverError) -> bool {
    matches!(
        err,
        DriverError::StaleElement(_)
            | DriverError::NoSuchElement(_)
            | DriverError::UnknownElement(_)
    )
}

impl fmt::Debug for Interactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interactor")
            .field("policy", &self.policy)
            .field("screenshot_on_failure", &self.screenshot_on_failure)
            .finish()
    }
}
