//! End-to-end UI test harness over the W3C WebDriver protocol.
//!
//! `proscenium` handles the boilerplate around browser-driven tests:
//! environment-based configuration, a per-browser driver factory,
//! wait-qualified element interaction with a script-click fallback, page
//! objects composed over a shared interaction layer, and a test lifecycle
//! that captures a screenshot and log entry whenever a test fails.
//!
//! The crate exposes no CLI and does no scheduling; test selection,
//! parallelism, and reporting belong to the external test runner. Each test
//! owns exactly one browser session, acquired and released through
//! [`harness::TestHarness`].

pub mod adapter;
pub mod artifacts;
pub mod config;
pub mod driver;
pub mod factory;
pub mod harness;
pub mod interact;
pub mod locator;
pub mod logging;
pub mod page;
pub mod pages;

pub use adapter::WebDriverBackend;
pub use config::{Browser, ConfigError, ProsceniumConfig, ProsceniumConfigOverrides, WindowSize};
pub use driver::{DriverError, DriverSession, ElementId, ScriptArg};
pub use harness::{HarnessError, TestHarness, TestSession};
pub use interact::{
    FailureRecord, InteractionError, Interactor, WaitCondition, WaitPolicy,
};
pub use locator::Locator;
pub use logging::{HarnessLogger, LogLevel, LogRecord};
pub use page::Page;
pub use pages::{HomePage, LoginPage};
