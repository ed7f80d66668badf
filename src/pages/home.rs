//! Home page object.

use std::sync::Arc;

use crate::interact::{InteractionError, Interactor};
use crate::locator::Locator;
use crate::page::Page;

pub struct HomePage {
    page: Page,
}

impl HomePage {
    pub fn new(interactor: Arc<Interactor>, base_url: &str) -> Self {
        Self {
            page: Page::at(interactor, base_url, "home"),
        }
    }

    fn welcome_banner() -> Locator {
        Locator::class("welcome-message")
    }

    fn user_menu() -> Locator {
        Locator::id("user-menu")
    }

    fn logout_link() -> Locator {
        Locator::link_text("Logout")
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn open(&self) -> Result<&Self, InteractionError> {
        self.page.open().await?;
        Ok(self)
    }

    pub async fn welcome_message(&self) -> Result<String, InteractionError> {
        self.page
            .interactor()
            .read_text(&Self::welcome_banner())
            .await
    }

    pub async fn open_user_menu(&self) -> Result<&Self, InteractionError> {
        self.page.interactor().click(&Self::user_menu()).await?;
        Ok(self)
    }

    /// Log the current user out through the user menu.
    pub async fn logout(&self) -> Result<&Self, InteractionError> {
        self.open_user_menu().await?;
        self.page.interactor().click(&Self::logout_link()).await?;
        Ok(self)
    }
}
