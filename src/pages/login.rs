//! Login page object.

use std::sync::Arc;

use crate::interact::{InteractionError, Interactor};
use crate::locator::Locator;
use crate::page::Page;

pub struct LoginPage {
    page: Page,
}

impl LoginPage {
    pub fn new(interactor: Arc<Interactor>, base_url: &str) -> Self {
        Self {
            page: Page::at(interactor, base_url, "login"),
        }
    }

    fn username_field() -> Locator {
        Locator::id("username")
    }

    fn password_field() -> Locator {
        Locator::id("password")
    }

    fn submit_button() -> Locator {
        Locator::xpath("//button[@type='submit']")
    }

    fn error_banner() -> Locator {
        Locator::class("error-message")
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn open(&self) -> Result<&Self, InteractionError> {
        self.page.open().await?;
        Ok(self)
    }

    pub async fn enter_username(&self, username: &str) -> Result<&Self, InteractionError> {
        self.page
            .interactor()
            .type_text(&Self::username_field(), username)
            .await?;
        Ok(self)
    }

    pub async fn enter_password(&self, password: &str) -> Result<&Self, InteractionError> {
        self.page
            .interactor()
            .type_text(&Self::password_field(), password)
            .await?;
        Ok(self)
    }

    pub async fn submit(&self) -> Result<&Self, InteractionError> {
        self.page.interactor().click(&Self::submit_button()).await?;
        Ok(self)
    }

    /// Complete the login flow in one call.
    pub async fn login(&self, username: &str, password: &str) -> Result<&Self, InteractionError> {
        self.page
            .interactor()
            .logger()
            .info(format!("Logging in as {username}"), Some("login"));
        self.enter_username(username)
            .await?
            .enter_password(password)
            .await?
            .submit()
            .await
    }

    pub async fn error_message(&self) -> Result<String, InteractionError> {
        self.page.interactor().read_text(&Self::error_banner()).await
    }

    pub async fn error_displayed(&self) -> bool {
        self.page.interactor().is_visible(&Self::error_banner()).await
    }
}
