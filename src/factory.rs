//! Driver factory: per-browser capability assembly and session creation.
//!
//! Capability construction is pure so it can be exercised without a running
//! WebDriver endpoint; [`create_session`] performs the actual connection
//! through the backend adapter.

use std::sync::Arc;

use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::adapter::WebDriverBackend;
use crate::config::{Browser, ProsceniumConfig};
use crate::driver::{DriverError, DriverSession};

/// Assemble the W3C capabilities for the configured browser.
///
/// Every browser gets the standard `timeouts` capability with the implicit
/// timeout pinned to zero (explicit waits are the only wait mechanism) and a
/// fixed window size so headless runs have a deterministic viewport.
pub fn capabilities_for(config: &ProsceniumConfig) -> JsonMap<String, JsonValue> {
    let mut caps = JsonMap::new();
    caps.insert(
        "browserName".to_string(),
        JsonValue::String(config.browser.wire_name().to_string()),
    );
    caps.insert(
        "timeouts".to_string(),
        json!({
            "implicit": 0,
            "pageLoad": config.page_load_timeout().as_millis() as u64,
            "script": 30_000,
        }),
    );

    match config.browser {
        Browser::Chrome => {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": chromium_args(config) }),
            );
        }
        Browser::Edge => {
            caps.insert(
                "ms:edgeOptions".to_string(),
                json!({ "args": chromium_args(config) }),
            );
        }
        Browser::Firefox => {
            let mut args = vec![
                format!("--width={}", config.window_size.width),
                format!("--height={}", config.window_size.height),
            ];
            if config.headless {
                args.push("-headless".to_string());
            }
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({
                    "args": args,
                    "prefs": {
                        "dom.webnotifications.enabled": false,
                        "media.volume_scale": "0.0",
                    },
                }),
            );
        }
    }

    caps
}

fn chromium_args(config: &ProsceniumConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
        format!(
            "--window-size={},{}",
            config.window_size.width, config.window_size.height
        ),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args
}

/// Create a driver session bound to the configured browser.
///
/// The returned handle must be released exactly once via
/// [`DriverSession::close`]. A connection failure is
/// [`DriverError::Startup`] and is fatal for the current test only.
pub async fn create_session(
    config: &ProsceniumConfig,
) -> Result<Arc<dyn DriverSession>, DriverError> {
    let backend = WebDriverBackend::connect(config).await?;
    Ok(Arc::new(backend))
}
