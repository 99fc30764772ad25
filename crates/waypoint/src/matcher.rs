//! Literal-or-pattern text matching.
//!
//! Literals are case-sensitive substring matches against rendered labels.
//! Patterns are unanchored regex searches; anchor with `^`/`$` when needed.
//!
//! Patterns also run in the page as JavaScript `RegExp`s, so they must stay in
//! the syntax both engines share. A leading inline flag group such as `(?i)`
//! becomes a JavaScript flag. Other Rust-only constructs (`\A`, `\z`,
//! `[[:alpha:]]`, class set operations, mid-pattern flags) pass through
//! untranslated and either throw in the page or match differently there.

use regex::Regex;
use std::fmt;

/// Text to match against a rendered label
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Case-sensitive substring
    Literal(String),
    /// Regular expression search
    Pattern(Regex),
}

impl TextMatch {
    /// Create a literal matcher
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Create a pattern matcher
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for an invalid pattern
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    /// Match labels starting with `prefix`
    #[must_use]
    pub fn prefix(prefix: &str) -> Self {
        // Escaped input always compiles
        match Regex::new(&format!("^{}", regex::escape(prefix))) {
            Ok(re) => Self::Pattern(re),
            Err(_) => Self::Literal(prefix.to_string()),
        }
    }

    /// Whether `text` satisfies this matcher
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Literal(needle) => text.contains(needle.as_str()),
            Self::Pattern(re) => re.is_match(text),
        }
    }

    /// Source text of the matcher
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Pattern(re) => re.as_str(),
        }
    }

    /// JavaScript predicate over a string, e.g. `(t) => t.includes("HQ")`
    #[must_use]
    pub fn to_js(&self) -> String {
        match self {
            Self::Literal(s) => format!("(t) => t.includes({})", js_string(s)),
            Self::Pattern(re) => {
                let (source, flags) = js_regex(re.as_str());
                format!(
                    "(t) => new RegExp({}, {}).test(t)",
                    js_string(source),
                    js_string(&flags)
                )
            }
        }
    }
}

/// Split a leading `(?ims)` group off `source` as JavaScript flags
///
/// Groups with other flags, negations or a scoped body are left in place.
fn js_regex(source: &str) -> (&str, String) {
    let Some(rest) = source.strip_prefix("(?") else {
        return (source, String::new());
    };
    let Some(end) = rest.find(')') else {
        return (source, String::new());
    };
    let flags = &rest[..end];
    if flags.is_empty() || !flags.chars().all(|c| matches!(c, 'i' | 'm' | 's')) {
        return (source, String::new());
    }
    let mut js_flags: Vec<char> = flags.chars().collect();
    js_flags.sort_unstable();
    js_flags.dedup();
    (&rest[end + 1..], js_flags.into_iter().collect())
}

/// Encode `s` as a JavaScript string literal
pub(crate) fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl PartialEq for TextMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(s) => write!(f, "{s:?}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for TextMatch {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<&String> for TextMatch {
    fn from(s: &String) -> Self {
        Self::Literal(s.clone())
    }
}

impl From<Regex> for TextMatch {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}
