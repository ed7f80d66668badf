//! `fantoccini`-backed [`DriverSession`] implementation.
//!
//! The backend owns one WebDriver session and a registry of the element
//! handles it has issued. Handles are opaque string tokens; the registry maps
//! them back to live wire elements for follow-up commands. Protocol failures
//! are classified into the driver error taxonomy from the W3C error strings,
//! which are stable across chromedriver, geckodriver, and Selenium.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator as WireLocator};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use crate::config::ProsceniumConfig;
use crate::driver::{DriverError, DriverSession, ElementId, ScriptArg};
use crate::factory::capabilities_for;
use crate::locator::Locator;

pub struct WebDriverBackend {
    client: Mutex<Option<Client>>,
    elements: Mutex<HashMap<ElementId, Element>>,
    next_element: Mutex<u64>,
}

impl WebDriverBackend {
    /// Open a session against the configured WebDriver endpoint.
    pub async fn connect(config: &ProsceniumConfig) -> Result<Self, DriverError> {
        let caps = capabilities_for(config);
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|err| DriverError::Startup(err.to_string()))?;

        // Fix the window size after session creation too: headless engines
        // otherwise pick their own default viewport.
        client
            .set_window_size(config.window_size.width, config.window_size.height)
            .await
            .map_err(classify_cmd_error)?;

        Ok(Self {
            client: Mutex::new(Some(client)),
            elements: Mutex::new(HashMap::new()),
            next_element: Mutex::new(0),
        })
    }

    async fn client(&self) -> Result<Client, DriverError> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or(DriverError::SessionClosed)
    }

    async fn element(&self, id: &ElementId) -> Result<Element, DriverError> {
        self.elements
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DriverError::UnknownElement(id.clone()))
    }

    async fn register(&self, element: Element) -> ElementId {
        let mut next = self.next_element.lock().await;
        let id = format!("element-{}", *next);
        *next += 1;
        self.elements.lock().await.insert(id.clone(), element);
        id
    }
}

#[async_trait]
impl DriverSession for WebDriverBackend {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let client = self.client().await?;
        client.goto(url).await.map_err(classify_cmd_error)
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementId>, DriverError> {
        let client = self.client().await?;
        let selector = locator.selector().into_owned();
        match client.find(wire_locator(locator, &selector)).await {
            Ok(element) => Ok(Some(self.register(element).await)),
            Err(err) => match classify_cmd_error(err) {
                DriverError::NoSuchElement(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        let element = self.element(element).await?;
        element.click().await.map_err(classify_cmd_error)
    }

    async fn text(&self, element: &ElementId) -> Result<String, DriverError> {
        let element = self.element(element).await?;
        element.text().await.map_err(classify_cmd_error)
    }

    async fn attribute(
        &self,
        element: &ElementId,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let element = self.element(element).await?;
        element.attr(name).await.map_err(classify_cmd_error)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        let element = self.element(element).await?;
        element.is_displayed().await.map_err(classify_cmd_error)
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool, DriverError> {
        let element = self.element(element).await?;
        element.is_enabled().await.map_err(classify_cmd_error)
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError> {
        let element = self.element(element).await?;
        element.send_keys(text).await.map_err(classify_cmd_error)
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        let element = self.element(element).await?;
        element.clear().await.map_err(classify_cmd_error)
    }

    async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg>,
    ) -> Result<JsonValue, DriverError> {
        let client = self.client().await?;
        let mut wire_args = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                ScriptArg::Value(value) => wire_args.push(value),
                ScriptArg::Element(id) => {
                    let element = self.element(&id).await?;
                    let value = serde_json::to_value(&element).map_err(|err| {
                        DriverError::Script(format!("failed to encode element argument: {err}"))
                    })?;
                    wire_args.push(value);
                }
            }
        }
        client
            .execute(script, wire_args)
            .await
            .map_err(classify_cmd_error)
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        let client = self.client().await?;
        let png = client.screenshot().await.map_err(classify_cmd_error)?;
        tokio::fs::write(path, png).await.map_err(|err| {
            DriverError::Wire(format!(
                "failed to write screenshot {}: {err}",
                path.display()
            ))
        })
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        let client = self.client().await?;
        let url = client.current_url().await.map_err(classify_cmd_error)?;
        Ok(url.to_string())
    }

    async fn title(&self) -> Result<String, DriverError> {
        let client = self.client().await?;
        client.title().await.map_err(classify_cmd_error)
    }

    async fn close(&self) -> Result<(), DriverError> {
        let client = {
            let mut guard = self.client.lock().await;
            guard.take().ok_or(DriverError::SessionClosed)?
        };
        self.elements.lock().await.clear();
        client.close().await.map_err(classify_cmd_error)
    }
}

fn wire_locator<'a>(locator: &Locator, selector: &'a str) -> WireLocator<'a> {
    match locator {
        Locator::XPath(_) => WireLocator::XPath(selector),
        Locator::LinkText(_) => WireLocator::LinkText(selector),
        // Id, Class, and Tag arrive here already normalised to CSS.
        _ => WireLocator::Css(selector),
    }
}

fn classify_cmd_error(err: fantoccini::error::CmdError) -> DriverError {
    classify_message(err.to_string())
}

/// Map a WebDriver error string onto the driver taxonomy.
///
/// The interception markers cover the "element click intercepted" W3C code
/// plus the driver-specific phrasings chromedriver and geckodriver use for
/// obscured click targets.
fn classify_message(message: String) -> DriverError {
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("click intercepted")
        || lowered.contains("not clickable")
        || lowered.contains("obscure")
        || lowered.contains("not interactable")
    {
        DriverError::ClickIntercepted(message)
    } else if lowered.contains("stale element") {
        DriverError::StaleElement(message)
    } else if lowered.contains("no such element") || lowered.contains("unable to locate element") {
        DriverError::NoSuchElement(message)
    } else if lowered.contains("javascript error") || lowered.contains("script timeout") {
        DriverError::Script(message)
    } else {
        DriverError::Wire(message)
    }
}
