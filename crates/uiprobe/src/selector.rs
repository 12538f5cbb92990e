//! Element selection: native lookup selectors and tree predicates.
//!
//! A [`Selector`] is handed to the device session as-is (`"id"`,
//! `"accessibility id"`, `"xpath"`, ...). An [`ElementPredicate`] runs
//! locally against a parsed [`Tree`](crate::tree::Tree).

use crate::result::{ProbeError, ProbeResult};
use crate::tree::model::Element;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Property/value pair understood by the session's native element lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    /// Lookup strategy, e.g. `"id"` or `"accessibility id"`
    pub property: String,
    /// Value to look for
    pub value: String,
}

impl Selector {
    /// Create a selector for an arbitrary lookup strategy
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    /// Resource id selector
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new("id", value)
    }

    /// Accessibility identifier selector
    #[must_use]
    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new("accessibility id", value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"='{}'", self.property, self.value)
    }
}

/// A local test applied to tree elements
pub trait ElementPredicate: Send + Sync {
    /// Whether `element` is accepted
    fn matches(&self, element: &Element) -> bool;

    /// Human readable description, used in error messages
    fn describe(&self) -> String;
}

/// Declarative element matchers
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact text label
    Text(String),
    /// Text label matching a regular expression
    TextMatches(Regex),
    /// Exact resource id
    Id(String),
    /// Exact element type
    Type(String),
    /// Exact accessibility identifier
    AccessibilityId(String),
    /// Clickable flag
    Clickable(bool),
    /// Every inner matcher must accept
    AllOf(Vec<Matcher>),
}

impl Matcher {
    /// Match on a text label regular expression
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::InvalidArgument`] if the pattern does not compile.
    pub fn text_matches(pattern: &str) -> ProbeResult<Self> {
        Regex::new(pattern)
            .map(Self::TextMatches)
            .map_err(|e| ProbeError::invalid_argument(format!("invalid text pattern: {e}")))
    }

    /// Combine with another matcher
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::AllOf(mut all) => {
                all.push(other);
                Self::AllOf(all)
            }
            single => Self::AllOf(vec![single, other]),
        }
    }
}

impl ElementPredicate for Matcher {
    fn matches(&self, element: &Element) -> bool {
        match self {
            Self::Text(text) => element.has_text(text),
            Self::TextMatches(re) => element.text.as_deref().is_some_and(|t| re.is_match(t)),
            Self::Id(id) => element.id.as_deref() == Some(id.as_str()),
            Self::Type(element_type) => element.element_type == *element_type,
            Self::AccessibilityId(a11y) => element.accessibility_id.as_deref() == Some(a11y.as_str()),
            Self::Clickable(clickable) => element.clickable == *clickable,
            Self::AllOf(all) => all.iter().all(|m| m.matches(element)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("text={text:?}"),
            Self::TextMatches(re) => format!("text~/{}/", re.as_str()),
            Self::Id(id) => format!("id={id:?}"),
            Self::Type(element_type) => format!("type={element_type:?}"),
            Self::AccessibilityId(a11y) => format!("accessibilityId={a11y:?}"),
            Self::Clickable(clickable) => format!("clickable={clickable}"),
            Self::AllOf(all) => all
                .iter()
                .map(ElementPredicate::describe)
                .collect::<Vec<_>>()
                .join(" && "),
        }
    }
}

/// Closure-backed predicate with an explicit description
pub struct FnPredicate<F>
where
    F: Fn(&Element) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> FnPredicate<F>
where
    F: Fn(&Element) -> bool + Send + Sync,
{
    /// Create a new predicate
    pub fn new(description: impl Into<String>, predicate: F) -> Self {
        Self {
            predicate,
            description: description.into(),
        }
    }
}

impl<F> fmt::Debug for FnPredicate<F>
where
    F: Fn(&Element) -> bool + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> ElementPredicate for FnPredicate<F>
where
    F: Fn(&Element) -> bool + Send + Sync,
{
    fn matches(&self, element: &Element) -> bool {
        (self.predicate)(element)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// Which match to act on when a predicate accepts several elements.
///
/// Positions refer to enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePosition {
    /// First match
    First,
    /// Last match
    Last,
    /// Zero-based match index
    Index(usize),
}

impl Default for NodePosition {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl NodePosition {
    /// Pick the item at this position, if there is one
    #[must_use]
    pub fn select<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        match self {
            Self::First => items.first(),
            Self::Last => items.last(),
            Self::Index(n) => items.get(*n),
        }
    }
}

impl fmt::Display for NodePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Last => f.write_str("last"),
            Self::Index(n) => write!(f, "{n}"),
        }
    }
}
