//! End-to-end harness flow against a scripted in-memory driver, mirroring the
//! login/logout journeys the page objects are built for.
//!
//! The final test is `#[ignore]`d: it drives a real browser and needs a
//! WebDriver endpoint (chromedriver, geckodriver, or a Selenium hub) reachable
//! at `WEBDRIVER_URL`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use proscenium::{
    Browser, DriverError, DriverSession, ElementId, HarnessError, HarnessLogger, InteractionError,
    Locator, LogLevel, ProsceniumConfig, ProsceniumConfigOverrides, ScriptArg, TestHarness,
    TestSession,
};

const BASE_URL: &str = "https://app.example.com";

#[derive(Default)]
struct AppState {
    current_url: String,
    username: String,
    password: String,
    menu_open: bool,
    error_shown: bool,
    elements: HashMap<ElementId, String>,
    next_element: u64,
    close_calls: u32,
    screenshots: Vec<std::path::PathBuf>,
}

/// Fake application: a login page at `/login` that accepts exactly
/// `testuser`/`testpass`, a dashboard, and a `/home` page with a user menu.
#[derive(Default)]
struct FakeApp {
    state: Mutex<AppState>,
}

impl FakeApp {
    fn on_login_page(state: &AppState) -> bool {
        state.current_url.contains("/login")
    }

    fn on_home_page(state: &AppState) -> bool {
        state.current_url.contains("/home")
    }

    fn element_present(state: &AppState, locator: &str) -> bool {
        match locator {
            "id=username" | "id=password" | "xpath=//button[@type='submit']" => {
                Self::on_login_page(state)
            }
            "class=error-message" => Self::on_login_page(state) && state.error_shown,
            "class=welcome-message" | "id=user-menu" => Self::on_home_page(state),
            "link-text=Logout" => Self::on_home_page(state) && state.menu_open,
            _ => false,
        }
    }
}

#[async_trait]
impl DriverSession for FakeApp {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.current_url = url.to_string();
        state.menu_open = false;
        state.elements.clear();
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> Result<Option<ElementId>, DriverError> {
        let mut state = self.state.lock().unwrap();
        let key = locator.to_string();
        if !Self::element_present(&state, &key) {
            return Ok(None);
        }
        let id = format!("element-{}", state.next_element);
        state.next_element += 1;
        state.elements.insert(id.clone(), key);
        Ok(Some(id))
    }

    async fn click(&self, element: &ElementId) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state
            .elements
            .get(element)
            .cloned()
            .ok_or_else(|| DriverError::UnknownElement(element.clone()))?;
        match locator.as_str() {
            "xpath=//button[@type='submit']" => {
                if state.username == "testuser" && state.password == "testpass" {
                    state.error_shown = false;
                    state.current_url = format!("{BASE_URL}/dashboard");
                } else {
                    state.error_shown = true;
                }
            }
            "id=user-menu" => state.menu_open = true,
            "link-text=Logout" => {
                state.menu_open = false;
                state.current_url = format!("{BASE_URL}/login");
            }
            _ => {}
        }
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String, DriverError> {
        let state = self.state.lock().unwrap();
        match state.elements.get(element).map(String::as_str) {
            Some("class=welcome-message") => Ok(format!("Welcome, {}!", state.username)),
            Some("class=error-message") => Ok("Invalid username or password".to_string()),
            Some(_) => Ok(String::new()),
            None => Err(DriverError::UnknownElement(element.clone())),
        }
    }

    async fn attribute(
        &self,
        _element: &ElementId,
        _name: &str,
    ) -> Result<Option<String>, DriverError> {
        Ok(None)
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool, DriverError> {
        let state = self.state.lock().unwrap();
        Ok(state.elements.contains_key(element))
    }

    async fn is_enabled(&self, _element: &ElementId) -> Result<bool, DriverError> {
        Ok(true)
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state
            .elements
            .get(element)
            .cloned()
            .ok_or_else(|| DriverError::UnknownElement(element.clone()))?;
        match locator.as_str() {
            "id=username" => state.username.push_str(text),
            "id=password" => state.password.push_str(text),
            _ => {}
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        let locator = state
            .elements
            .get(element)
            .cloned()
            .ok_or_else(|| DriverError::UnknownElement(element.clone()))?;
        match locator.as_str() {
            "id=username" => state.username.clear(),
            "id=password" => state.password.clear(),
            _ => {}
        }
        Ok(())
    }

    async fn execute_script(
        &self,
        _script: &str,
        _args: Vec<ScriptArg>,
    ) -> Result<JsonValue, DriverError> {
        Ok(JsonValue::String("complete".to_string()))
    }

    async fn screenshot(&self, path: &Path) -> Result<(), DriverError> {
        std::fs::create_dir_all(path.parent().unwrap_or(Path::new(".")))
            .map_err(|err| DriverError::Wire(err.to_string()))?;
        std::fs::write(path, b"").map_err(|err| DriverError::Wire(err.to_string()))?;
        self.state
            .lock()
            .unwrap()
            .screenshots
            .push(path.to_path_buf());
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn title(&self) -> Result<String, DriverError> {
        Ok("Fake App".to_string())
    }

    async fn close(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        if state.close_calls > 1 {
            Err(DriverError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

fn test_config(screenshots_dir: &Path) -> ProsceniumConfig {
    ProsceniumConfig::default().with_overrides(
        ProsceniumConfigOverrides::default()
            .base_url(BASE_URL)
            .explicit_wait_secs(2)
            .poll_interval_ms(50)
            .screenshots_path(screenshots_dir),
    )
}

fn scripted_harness(screenshots_dir: &Path) -> (TestHarness, Arc<FakeApp>, TestSession) {
    let config = test_config(screenshots_dir);
    let logger = Arc::new(HarnessLogger::new(LogLevel::Error));
    let harness = TestHarness::with_logger(config.clone(), Arc::clone(&logger));
    let driver = Arc::new(FakeApp::default());
    let session =
        TestSession::with_driver(config, Arc::clone(&driver) as Arc<dyn DriverSession>, logger);
    (harness, driver, session)
}

#[tokio::test]
async fn successful_login_lands_on_dashboard() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (harness, driver, session) = scripted_harness(dir.path());

    harness
        .run_with_session(session, "successful_login", |session| async move {
            let login = session.login_page();
            login.open().await?;
            login.login("testuser", "testpass").await?;

            let url = session.interactor().current_url().await?;
            if !url.contains("dashboard") {
                return Err(InteractionError::Script(format!(
                    "expected dashboard after login, got {url}"
                )));
            }
            Ok(())
        })
        .await
        .expect("login journey succeeds");

    let state = driver.state.lock().unwrap();
    assert_eq!(state.current_url, format!("{BASE_URL}/dashboard"));
    assert_eq!(state.close_calls, 1);
    assert!(state.screenshots.is_empty());
}

#[tokio::test]
async fn invalid_login_surfaces_error_banner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (harness, driver, session) = scripted_harness(dir.path());
    let seen_error = Arc::new(Mutex::new(None));
    let seen = Arc::clone(&seen_error);

    harness
        .run_with_session(session, "invalid_login", |session| async move {
            let login = session.login_page();
            login.open().await?;
            login.login("invalid", "invalid").await?;
            *seen.lock().unwrap() = Some(login.error_message().await?);
            Ok(())
        })
        .await
        .expect("error path is not a harness failure");

    let message = seen_error.lock().unwrap().clone().expect("error banner read");
    assert!(message.to_lowercase().contains("invalid"));
    assert!(driver.state.lock().unwrap().error_shown);
}

#[tokio::test]
async fn logout_returns_to_login_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (harness, driver, session) = scripted_harness(dir.path());

    harness
        .run_with_session(session, "logout", |session| async move {
            let login = session.login_page();
            login.open().await?;
            login.login("testuser", "testpass").await?;

            let home = session.home_page();
            home.open().await?;
            home.logout().await?;

            let url = session.interactor().current_url().await?;
            if !url.contains("login") {
                return Err(InteractionError::Script(format!(
                    "expected login page after logout, got {url}"
                )));
            }
            Ok(())
        })
        .await
        .expect("logout journey succeeds");

    assert_eq!(
        driver.state.lock().unwrap().current_url,
        format!("{BASE_URL}/login")
    );
}

#[tokio::test]
async fn failed_test_leaves_screenshot_and_releases_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (harness, driver, session) = scripted_harness(dir.path());

    let result = harness
        .run_with_session(session, "broken_journey", |session| async move {
            let login = session.login_page();
            login.open().await?;
            // This element never exists anywhere in the fake app.
            session
                .interactor()
                .read_text(&Locator::id("no-such-widget"))
                .await?;
            Ok(())
        })
        .await;

    match result {
        Err(HarnessError::TestFailed {
            name, screenshot, ..
        }) => {
            assert_eq!(name, "broken_journey");
            assert!(screenshot.expect("screenshot path").exists());
        }
        other => panic!("expected TestFailed, got {other:?}"),
    }

    let state = driver.state.lock().unwrap();
    assert_eq!(state.close_calls, 1);
    // One from the wait timeout, one from the harness failure capture.
    assert_eq!(state.screenshots.len(), 2);
}

#[tokio::test]
async fn unreachable_webdriver_endpoint_is_fatal_for_that_test_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut overrides = ProsceniumConfigOverrides::default().screenshots_path(dir.path());
    overrides.webdriver_url = Some("http://127.0.0.1:9".to_string());
    let config = ProsceniumConfig::default().with_overrides(overrides);
    let harness = TestHarness::with_logger(config, Arc::new(HarnessLogger::new(LogLevel::Error)));

    let result = harness
        .run("doomed_startup", |_session| async move {
            Ok::<(), InteractionError>(())
        })
        .await;

    assert!(matches!(result, Err(HarnessError::Startup(_))));
}

/// Real-browser smoke test. Requires a WebDriver endpoint; run with
/// `WEBDRIVER_URL=http://localhost:9515 cargo test -- --ignored`.
#[tokio::test]
#[ignore]
async fn real_browser_smoke() -> anyhow::Result<()> {
    let mut overrides = ProsceniumConfigOverrides::default()
        .base_url("https://example.com")
        .browser(Browser::Chrome)
        .headless(true);
    overrides.webdriver_url = std::env::var("WEBDRIVER_URL").ok();
    let config = ProsceniumConfig::from_env()?.with_overrides(overrides);

    let harness = TestHarness::new(config);
    harness
        .run("real_browser_smoke", |session| async move {
            session.interactor().goto("https://example.com").await?;
            let title = session.interactor().title().await?;
            if title.is_empty() {
                return Err(InteractionError::Script(
                    "expected a non-empty page title".to_string(),
                ));
            }
            Ok(())
        })
        .await?;
    Ok(())
}
