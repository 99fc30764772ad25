//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a chain of selection steps resolved fresh against the live
//! document on every operation. Nothing about a matched element is cached.
//!
//! ```
//! use waypoint::Locator;
//!
//! let site = Locator::new(".MissionDetails").get_by_text("Site").nth(0);
//! assert_eq!(site.describe(), r#"css(.MissionDetails) >> text("Site") >> nth(0)"#);
//! ```

use crate::geometry::Point;
use crate::matcher::{js_string, TextMatch};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression, evaluated relative to the current scope
    XPath(String),
    /// Innermost elements whose text content matches
    Text(TextMatch),
    /// ARIA role with optional accessible-name filter
    Role {
        /// Role name (e.g. "button", "tab")
        role: String,
        /// Accessible name to match
        name: Option<TextMatch>,
    },
    /// Inputs whose placeholder matches
    Placeholder(TextMatch),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::Text(text.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<TextMatch>) -> Self {
        Self::Role {
            role: role.into(),
            name,
        }
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<TextMatch>) -> Self {
        Self::Placeholder(text.into())
    }

    fn describe(&self) -> String {
        match self {
            Self::Css(s) => format!("css({s})"),
            Self::XPath(s) => format!("xpath({s})"),
            Self::Text(m) => format!("text({m})"),
            Self::Role { role, name: None } => format!("role({role})"),
            Self::Role {
                role,
                name: Some(name),
            } => format!("role({role}, name={name})"),
            Self::Placeholder(m) => format!("placeholder({m})"),
        }
    }

    /// JavaScript statement narrowing `els` to matches within each current element
    fn to_js_step(&self) -> String {
        match self {
            Self::Css(s) => format!(
                "els = els.flatMap(r => Array.from(r.querySelectorAll({})));",
                js_string(s)
            ),
            Self::XPath(s) => format!(
                "els = els.flatMap(r => {{ const xp = {}; \
                 const scoped = r.nodeType === 9 || !xp.startsWith('//') ? xp : '.' + xp; \
                 const snap = document.evaluate(scoped, r, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                 return Array.from({{ length: snap.snapshotLength }}, (_, i) => snap.snapshotItem(i)); }});",
                js_string(s)
            ),
            Self::Text(m) => format!(
                "{{ const p = {}; els = els.flatMap(r => Array.from(r.querySelectorAll('*')).filter(e => \
                 p(e.textContent || '') && !Array.from(e.children).some(c => p(c.textContent || '')))); }}",
                m.to_js()
            ),
            Self::Role { role, name } => {
                let css = role_css(role);
                let filter = name.as_ref().map_or_else(String::new, |n| {
                    format!(
                        " els = els.filter(e => ({})((e.getAttribute('aria-label') || e.textContent || '').trim()));",
                        n.to_js()
                    )
                });
                format!(
                    "els = els.flatMap(r => Array.from(r.querySelectorAll({})));{filter}",
                    js_string(&css)
                )
            }
            Self::Placeholder(m) => format!(
                "els = els.flatMap(r => Array.from(r.querySelectorAll('[placeholder]'))\
                 .filter(e => ({})(e.getAttribute('placeholder') || '')));",
                m.to_js()
            ),
        }
    }
}

/// CSS for an ARIA role including common implicit roles
fn role_css(role: &str) -> String {
    let implicit = match role {
        "button" => ", button, input[type=button], input[type=submit]",
        "link" => ", a[href]",
        "textbox" => ", input:not([type]), input[type=text], textarea",
        "checkbox" => ", input[type=checkbox]",
        "combobox" => ", select",
        "heading" => ", h1, h2, h3, h4, h5, h6",
        _ => "",
    };
    format!("[role=\"{role}\"]{implicit}")
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Select(Selector),
    HasText(TextMatch),
    Nth(i64),
}

/// A chain of selection steps identifying zero or more elements
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    steps: Vec<Step>,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_selector(Selector::Css(selector.into()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            steps: vec![Step::Select(selector)],
        }
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::from_selector(Selector::XPath(expr.into()))
    }

    /// Create a text locator over the whole document
    #[must_use]
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::from_selector(Selector::text(text))
    }

    /// Create a role locator over the whole document
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<TextMatch>) -> Self {
        Self::from_selector(Selector::role(role, name))
    }

    /// Create a placeholder locator over the whole document
    #[must_use]
    pub fn placeholder(text: impl Into<TextMatch>) -> Self {
        Self::from_selector(Selector::placeholder(text))
    }

    /// The `<body>` element
    #[must_use]
    pub fn body() -> Self {
        Self::new("body")
    }

    fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Narrow to descendants matching `selector`
    #[must_use]
    pub fn locator(self, selector: Selector) -> Self {
        self.then(Step::Select(selector))
    }

    /// Narrow to CSS descendants
    #[must_use]
    pub fn child(self, css: impl Into<String>) -> Self {
        self.locator(Selector::Css(css.into()))
    }

    /// Narrow to descendants whose text matches
    #[must_use]
    pub fn get_by_text(self, text: impl Into<TextMatch>) -> Self {
        self.locator(Selector::text(text))
    }

    /// Narrow to descendants with `role`
    #[must_use]
    pub fn get_by_role(self, role: impl Into<String>, name: Option<TextMatch>) -> Self {
        self.locator(Selector::role(role, name))
    }

    /// Narrow to descendants with a matching placeholder
    #[must_use]
    pub fn get_by_placeholder(self, text: impl Into<TextMatch>) -> Self {
        self.locator(Selector::placeholder(text))
    }

    /// Keep only matches whose text content matches
    #[must_use]
    pub fn with_text(self, text: impl Into<TextMatch>) -> Self {
        self.then(Step::HasText(text.into()))
    }

    /// Keep only the match at `index`; negative counts from the end
    #[must_use]
    pub fn nth(self, index: i64) -> Self {
        self.then(Step::Nth(index))
    }

    /// First match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Last match
    #[must_use]
    pub fn last(self) -> Self {
        self.nth(-1)
    }

    /// Stable human-readable form, e.g. `css(.x) >> nth(0)`
    #[must_use]
    pub fn describe(&self) -> String {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Select(sel) => sel.describe(),
                Step::HasText(m) => format!("has-text({m})"),
                Step::Nth(i) => format!("nth({i})"),
            })
            .collect::<Vec<_>>()
            .join(" >> ")
    }

    /// JavaScript expression evaluating to the array of matched elements
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut js = String::from("(() => { let els = [document];");
        for step in &self.steps {
            js.push(' ');
            match step {
                Step::Select(sel) => js.push_str(&sel.to_js_step()),
                Step::HasText(m) => js.push_str(&format!(
                    "els = els.filter(e => ({})(e.textContent || ''));",
                    m.to_js()
                )),
                Step::Nth(i) => js.push_str(&format!(
                    "els = [els[{i} < 0 ? els.length + ({i}) : {i}]].filter(Boolean);"
                )),
            }
            js.push_str(" els = [...new Set(els)];");
        }
        js.push_str(" return els; })()");
        js
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Bounding box for an element, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f64,
    /// Y position
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Top-left corner
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if a point is inside the bounding box
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}
