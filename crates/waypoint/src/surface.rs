//! BrowserSurface - the browser capability every page object drives
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  BrowserSurface (async trait, object safe)                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌─────────────────────┐        ┌─────────────────────┐        │
//! │   │  CdpSurface         │        │  MockSurface        │        │
//! │   │  (feature browser)  │        │  (always built)     │        │
//! │   │  chromiumoxide Page │        │  scripted scene     │        │
//! │   └─────────────────────┘        └─────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Element queries resolve the [`Locator`] against the live document each
//! call and act on the first match.

use crate::geometry::Point;
use crate::locator::{BoundingBox, Locator};
use crate::result::WaypointResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Keyboard keys the harness presses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Delete
    Delete,
    /// Escape
    Escape,
    /// Tab
    Tab,
    /// Backspace
    Backspace,
}

impl Key {
    /// DOM `KeyboardEvent.key` value
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Delete => "Delete",
            Self::Escape => "Escape",
            Self::Tab => "Tab",
            Self::Backspace => "Backspace",
        }
    }

    /// Windows virtual key code
    #[must_use]
    pub const fn key_code(self) -> i64 {
        match self {
            Self::Enter => 13,
            Self::Delete => 46,
            Self::Escape => 27,
            Self::Tab => 9,
            Self::Backspace => 8,
        }
    }

    /// Character typed by the key, if any
    #[must_use]
    pub const fn text(self) -> Option<&'static str> {
        match self {
            Self::Enter => Some("\r"),
            Self::Tab => Some("\t"),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for [`BrowserSurface::click`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClickOptions {
    /// Skip visibility and enabled checks
    pub force: bool,
    /// Click offset relative to the element's top-left corner
    pub position: Option<Point>,
}

impl ClickOptions {
    /// Forced click
    #[must_use]
    pub const fn forced() -> Self {
        Self {
            force: true,
            position: None,
        }
    }

    /// Click at an offset within the element
    #[must_use]
    pub const fn at(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }
}

/// Abstract browser surface for page automation
///
/// A single session drives one page sequentially. Implementations need
/// interior mutability for pointer state since every method takes `&self`.
#[async_trait]
pub trait BrowserSurface: Send + Sync {
    /// Number of elements matched
    async fn count(&self, locator: &Locator) -> WaypointResult<usize>;

    /// Text content of the first match
    async fn text_content(&self, locator: &Locator) -> WaypointResult<String>;

    /// Value of the first matched input
    async fn input_value(&self, locator: &Locator) -> WaypointResult<String>;

    /// Attribute of the first match, `None` when absent
    async fn attribute(&self, locator: &Locator, name: &str) -> WaypointResult<Option<String>>;

    /// Whether the first match is rendered; `false` when nothing matches
    async fn is_visible(&self, locator: &Locator) -> WaypointResult<bool>;

    /// Whether the first match accepts input
    async fn is_enabled(&self, locator: &Locator) -> WaypointResult<bool>;

    /// Whether the first matched toggle is checked
    async fn is_checked(&self, locator: &Locator) -> WaypointResult<bool>;

    /// Page-frame box of the first match, `None` when not rendered
    async fn bounding_box(&self, locator: &Locator) -> WaypointResult<Option<BoundingBox>>;

    /// Click the first match
    async fn click(&self, locator: &Locator, options: ClickOptions) -> WaypointResult<()>;

    /// Hover the first match
    async fn hover(&self, locator: &Locator) -> WaypointResult<()>;

    /// Replace the value of the first matched input
    async fn fill(&self, locator: &Locator, text: &str) -> WaypointResult<()>;

    /// Press `key` while the first match has focus
    async fn press(&self, locator: &Locator, key: Key) -> WaypointResult<()>;

    /// Type `text` one character at a time into the focused element
    async fn type_text(&self, text: &str, delay: Duration) -> WaypointResult<()>;

    /// Move the pointer to a page point in `steps` increments
    async fn mouse_move(&self, to: Point, steps: u32) -> WaypointResult<()>;

    /// Press the primary button at the pointer position
    async fn mouse_down(&self) -> WaypointResult<()>;

    /// Release the primary button at the pointer position
    async fn mouse_up(&self) -> WaypointResult<()>;

    /// Evaluate a script expression and return its JSON value
    async fn evaluate(&self, script: &str) -> WaypointResult<serde_json::Value>;

    /// Navigate and wait for the load event
    async fn goto(&self, url: &str) -> WaypointResult<()>;

    /// Capture a PNG screenshot of the viewport
    async fn screenshot(&self) -> WaypointResult<Vec<u8>>;

    /// Close the page target; no call may follow
    async fn close(&self) -> WaypointResult<()>;

    /// Sleep for `duration`
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_metadata() {
        assert_eq!(Key::Enter.name(), "Enter");
        assert_eq!(Key::Enter.key_code(), 13);
        assert_eq!(Key::Enter.text(), Some("\r"));
        assert_eq!(Key::Delete.text(), None);
    }

    #[test]
    fn test_click_options() {
        let opts = ClickOptions::forced().at(Point::new(1.0, 2.0));
        assert!(opts.force);
        assert_eq!(opts.position, Some(Point::new(1.0, 2.0)));
        assert!(!ClickOptions::default().force);
    }
}
