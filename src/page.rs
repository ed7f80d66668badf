//! Base page abstraction for the page object model.
//!
//! A [`Page`] bundles a URL with the shared [`Interactor`]; concrete page
//! objects compose one of these and add locators plus semantic actions. No
//! inheritance is involved: pages delegate every element access to the
//! interaction layer and return themselves from actions so calls chain.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::time::{self, Instant};

use crate::interact::{InteractionError, Interactor};

const READY_STATE_SCRIPT: &str = "return document.readyState;";

/// One application page: a URL plus the interaction layer that drives it.
#[derive(Debug, Clone)]
pub struct Page {
    interactor: Arc<Interactor>,
    url: String,
}

impl Page {
    pub fn new(interactor: Arc<Interactor>, url: impl Into<String>) -> Self {
        Self {
            interactor,
            url: url.into(),
        }
    }

    /// Build a page at `base_url` joined with `path`.
    pub fn at(interactor: Arc<Interactor>, base_url: &str, path: &str) -> Self {
        let url = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Self::new(interactor, url)
    }

    pub fn interactor(&self) -> &Arc<Interactor> {
        &self.interactor
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Navigate to this page's URL.
    pub async fn open(&self) -> Result<&Self, InteractionError> {
        self.interactor.goto(&self.url).await?;
        Ok(self)
    }

    pub async fn title(&self) -> Result<String, InteractionError> {
        self.interactor.title().await
    }

    pub async fn current_url(&self) -> Result<String, InteractionError> {
        self.interactor.current_url().await
    }

    /// Poll `document.readyState` until the page reports itself complete.
    pub async fn wait_for_page_load(&self) -> Result<(), InteractionError> {
        let policy = self.interactor.policy();
        let started = Instant::now();
        let deadline = started + policy.timeout;

        loop {
            let state = self
                .interactor
                .execute_script(READY_STATE_SCRIPT, Vec::new())
                .await?;
            if state == JsonValue::String("complete".to_string()) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(InteractionError::PageLoadTimeout {
                    elapsed: started.elapsed(),
                });
            }
            time::sleep(policy.poll_interval).await;
        }
    }

    /// Capture a screenshot named after this page or an explicit label.
    pub async fn screenshot(&self, name: &str) -> Result<PathBuf, InteractionError> {
        self.interactor.screenshot(name).await
    }
}
