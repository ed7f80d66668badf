//! Element location strategies.
//!
//! A [`Locator`] is a value object pairing a strategy with a selector string.
//! Locators are re-evaluated on every lookup; no resolved element handle is
//! ever kept across an action boundary, so a DOM mutation between two
//! operations can never leave the harness holding a dead node.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Strategy plus selector identifying zero or more elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "selector", rename_all = "lowercase")]
pub enum Locator {
    Id(String),
    Css(String),
    XPath(String),
    Class(String),
    Tag(String),
    LinkText(String),
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Locator::Id(value.into())
    }

    pub fn css(value: impl Into<String>) -> Self {
        Locator::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Locator::XPath(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        Locator::Class(value.into())
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Locator::Tag(value.into())
    }

    pub fn link_text(value: impl Into<String>) -> Self {
        Locator::LinkText(value.into())
    }

    /// W3C location strategy name. Id and Class normalise to CSS selection,
    /// which is how the wire protocol expects them.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Id(_) | Locator::Css(_) | Locator::Class(_) => "css selector",
            Locator::XPath(_) => "xpath",
            Locator::Tag(_) => "tag name",
            Locator::LinkText(_) => "link text",
        }
    }

    /// Selector string as sent over the wire for [`Locator::strategy`].
    pub fn selector(&self) -> Cow<'_, str> {
        match self {
            Locator::Id(value) => Cow::Owned(format!("[id=\"{value}\"]")),
            Locator::Class(value) => Cow::Owned(format!(".{value}")),
            Locator::Css(value)
            | Locator::XPath(value)
            | Locator::Tag(value)
            | Locator::LinkText(value) => Cow::Borrowed(value),
        }
    }

    fn raw(&self) -> &str {
        match self {
            Locator::Id(value)
            | Locator::Css(value)
            | Locator::XPath(value)
            | Locator::Class(value)
            | Locator::Tag(value)
            | Locator::LinkText(value) => value,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Locator::Id(_) => "id",
            Locator::Css(_) => "css",
            Locator::XPath(_) => "xpath",
            Locator::Class(_) => "class",
            Locator::Tag(_) => "tag",
            Locator::LinkText(_) => "link-text",
        }
    }

    /// Filename-safe rendering used when naming failure screenshots.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.raw().len() + 8);
        slug.push_str(self.kind());
        slug.push('_');
        for ch in self.raw().chars() {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                slug.push(ch);
            } else {
                slug.push('_');
            }
        }
        slug
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind(), self.raw())
    }
}
