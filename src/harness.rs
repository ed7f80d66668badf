//! Per-test lifecycle: acquire a driver session, run the test body, capture
//! evidence on failure, and release the session on every exit path.
//!
//! Reporting beyond logs and screenshots is the external test runner's job;
//! the harness only turns interaction failures into structured outcomes.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ProsceniumConfig};
use crate::driver::{DriverError, DriverSession};
use crate::factory;
use crate::interact::{InteractionError, Interactor};
use crate::logging::HarnessLogger;
use crate::page::Page;
use crate::pages::{HomePage, LoginPage};

/// Outcome of a harness-managed test.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("driver startup failed: {0}")]
    Startup(#[source] DriverError),
    #[error("test '{name}' failed: {source}")]
    TestFailed {
        name: String,
        screenshot: Option<PathBuf>,
        #[source]
        source: InteractionError,
    },
}

/// Entry point owning configuration and logging for a test run.
pub struct TestHarness {
    config: ProsceniumConfig,
    logger: Arc<HarnessLogger>,
}

impl TestHarness {
    pub fn new(config: ProsceniumConfig) -> Self {
        let logger = Arc::new(HarnessLogger::new(config.log_level));
        Self { config, logger }
    }

    /// Build a harness from environment configuration with a log file under
    /// the configured logs directory.
    pub fn from_env() -> Result<Self, HarnessError> {
        let config = ProsceniumConfig::from_env()?;
        let logger = match HarnessLogger::new(config.log_level).with_log_file(&config.logs_path) {
            Ok(logger) => logger,
            // Unwritable logs directory: continue console-only.
            Err(err) => {
                let logger = HarnessLogger::new(config.log_level);
                logger.error(format!("log file unavailable: {err}"), Some("harness"));
                logger
            }
        };
        Ok(Self::with_logger(config, Arc::new(logger)))
    }

    pub fn with_logger(config: ProsceniumConfig, logger: Arc<HarnessLogger>) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &ProsceniumConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<HarnessLogger> {
        &self.logger
    }

    /// Create a driver session and wrap it in a [`TestSession`].
    ///
    /// Startup failures are fatal for the current test only; callers move on
    /// to the next test.
    pub async fn start(&self) -> Result<TestSession, HarnessError> {
        let driver = match factory::create_session(&self.config).await {
            Ok(driver) => driver,
            Err(err) => {
                self.logger
                    .error(format!("driver startup failed: {err}"), Some("harness"));
                return Err(HarnessError::Startup(err));
            }
        };
        self.logger.info(
            format!("{} driver session created", self.config.browser.wire_name()),
            Some("harness"),
        );
        Ok(TestSession::with_driver(
            self.config.clone(),
            driver,
            Arc::clone(&self.logger),
        ))
    }

    /// Run one named test body against a fresh session.
    pub async fn run<F, Fut>(&self, name: &str, body: F) -> Result<(), HarnessError>
    where
        F: FnOnce(TestSession) -> Fut,
        Fut: Future<Output = Result<(), InteractionError>>,
    {
        let session = self.start().await?;
        self.run_with_session(session, name, body).await
    }

    /// [`TestHarness::run`] against an already-created session. The session
    /// is released before this returns, whatever the outcome.
    pub async fn run_with_session<F, Fut>(
        &self,
        session: TestSession,
        name: &str,
        body: F,
    ) -> Result<(), HarnessError>
    where
        F: FnOnce(TestSession) -> Fut,
        Fut: Future<Output = Result<(), InteractionError>>,
    {
        self.logger
            .info(format!("Starting test: {name}"), Some("harness"));

        let outcome = body(session.clone()).await;
        let result = match outcome {
            Ok(()) => Ok(()),
            Err(source) => {
                let screenshot = session
                    .interactor()
                    .capture_failure(&format!("FAILED_{name}"))
                    .await;
                self.logger
                    .error(format!("test '{name}' failed: {source}"), Some("harness"));
                Err(HarnessError::TestFailed {
                    name: name.to_string(),
                    screenshot,
                    source,
                })
            }
        };

        session.close().await;
        self.logger
            .info(format!("Finished test: {name}"), Some("harness"));
        result
    }
}

/// One live driver session plus the components built on top of it.
#[derive(Clone)]
pub struct TestSession {
    config: ProsceniumConfig,
    interactor: Arc<Interactor>,
}

impl TestSession {
    /// Wrap an existing driver handle; used by [`TestHarness::start`] and by
    /// tests injecting scripted drivers.
    pub fn with_driver(
        config: ProsceniumConfig,
        driver: Arc<dyn DriverSession>,
        logger: Arc<HarnessLogger>,
    ) -> Self {
        let interactor = Arc::new(Interactor::new(driver, &config, logger));
        Self { config, interactor }
    }

    pub fn config(&self) -> &ProsceniumConfig {
        &self.config
    }

    pub fn interactor(&self) -> &Arc<Interactor> {
        &self.interactor
    }

    /// A base page at `base_url` joined with `path`.
    pub fn page(&self, path: &str) -> Page {
        Page::at(
            Arc::clone(&self.interactor),
            &self.config.base_url,
            path,
        )
    }

    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(Arc::clone(&self.interactor), &self.config.base_url)
    }

    pub fn home_page(&self) -> HomePage {
        HomePage::new(Arc::clone(&self.interactor), &self.config.base_url)
    }

    /// Release the underlying driver handle. Safe to call if the body already
    /// closed it; real close failures are logged, never raised.
    pub async fn close(&self) {
        match self.interactor.driver().close().await {
            Ok(()) => {}
            Err(DriverError::SessionClosed) => {
                self.interactor
                    .logger()
                    .debug("driver session already released", Some("harness"));
            }
            Err(err) => {
                self.interactor
                    .logger()
                    .error(format!("failed to release driver session: {err}"), Some("harness"));
            }
        }
    }
}

impl std::fmt::Debug for TestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("browser", &self.config.browser)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
