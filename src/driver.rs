//! The capability surface between the interaction layer and a concrete
//! browser backend.
//!
//! [`DriverSession`] is the only interface higher-level components see.
//! Elements cross the seam as opaque [`ElementId`] tokens that stay valid
//! only until the next navigation or DOM mutation; callers re-resolve their
//! locators instead of caching handles.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::locator::Locator;

/// Opaque token referencing an element previously resolved by [`DriverSession::find`].
pub type ElementId = String;

/// Argument passed to [`DriverSession::execute_script`].
///
/// Scripts receive plain JSON values or previously resolved elements; the
/// backend converts elements into the protocol's element representation so
/// `arguments[n]` is the live node inside the page.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptArg {
    Value(JsonValue),
    Element(ElementId),
}

impl From<JsonValue> for ScriptArg {
    fn from(value: JsonValue) -> Self {
        ScriptArg::Value(value)
    }
}

impl From<&str> for ScriptArg {
    fn from(value: &str) -> Self {
        ScriptArg::Value(JsonValue::String(value.to_string()))
    }
}

/// Errors surfaced by a browser backend.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to start browser session: {0}")]
    Startup(String),
    #[error("click intercepted: {0}")]
    ClickIntercepted(String),
    #[error("stale element reference: {0}")]
    StaleElement(String),
    #[error("no such element: {0}")]
    NoSuchElement(String),
    #[error("unknown element handle '{0}'")]
    UnknownElement(ElementId),
    #[error("script execution failed: {0}")]
    Script(String),
    #[error("session already closed")]
    SessionClosed,
    #[error("webdriver error: {0}")]
    Wire(String),
}

/// One browser session, exclusively owned by one test at a time.
///
/// Implementations must be safe to share behind an `Arc`; the harness makes
/// no concurrent calls, but page objects and the interactor hold clones of
/// the same handle.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Navigate to an absolute URL.
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Resolve a locator to at most one element. `Ok(None)` means the page
    /// currently has no match; transport failures are errors.
    async fn find(&self, locator: &Locator) -> Result<Option<ElementId>, DriverError>;

    /// Native click on a resolved element.
    async fn click(&self, element: &ElementId) -> Result<(), DriverError>;

    async fn text(&self, element: &ElementId) -> Result<String, DriverError>;

    async fn attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError>;

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError>;

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError>;

    /// Execute a script in the page and return its JSON result.
    async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg>,
    ) -> Result<JsonValue, DriverError>;

    /// Write a PNG screenshot of the current viewport to `path`.
    async fn screenshot(&self, path: &Path) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    async fn title(&self) -> Result<String, DriverError>;

    /// Release the session. Must be called exactly once; later calls return
    /// [`DriverError::SessionClosed`].
    async fn close(&self) -> Result<(), DriverError>;
}
