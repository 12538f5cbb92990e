//! Typed UI tree: one snapshot of the device's view hierarchy.

use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system of the device that produced the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    /// Android device
    Android,
    /// iOS device
    Ios,
}

impl OsKind {
    /// Value used in the `osType` attribute
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// Parse the `osType` attribute value
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            _ => None,
        }
    }
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a top-level UI surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    /// Status bar
    #[serde(rename = "window.status")]
    Status,
    /// Navigation bar
    #[serde(rename = "window.navigation")]
    Navigation,
    /// Software keyboard
    #[serde(rename = "window.keyboard")]
    Keyboard,
    /// Main application surface
    #[serde(rename = "window.main")]
    Main,
}

impl WindowKind {
    /// All window kinds, in a stable order
    pub const ALL: [Self; 4] = [Self::Status, Self::Navigation, Self::Keyboard, Self::Main];

    /// Value used in the window `type` attribute
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "window.status",
            Self::Navigation => "window.navigation",
            Self::Keyboard => "window.keyboard",
            Self::Main => "window.main",
        }
    }

    /// Parse the window `type` attribute value
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility reported for an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Fully visible
    Visible,
    /// Drawn but see-through
    Transparent,
    /// Not drawn
    Hidden,
    /// Not reported by the device
    #[default]
    Unknown,
}

impl Visibility {
    /// Value used in the `visibility` attribute
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Transparent => "transparent",
            Self::Hidden => "hidden",
            Self::Unknown => "unknown",
        }
    }

    /// Parse the `visibility` attribute value
    #[must_use]
    pub fn from_attribute(value: &str) -> Option<Self> {
        match value {
            "visible" => Some(Self::Visible),
            "transparent" => Some(Self::Transparent),
            "hidden" => Some(Self::Hidden),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a window's view hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct Element {
    /// Position among its siblings, as reported by the device.
    /// Not guaranteed to match the position in `children`.
    pub index: u32,
    /// Element type (class name on Android, element type on iOS)
    #[serde(rename = "type")]
    pub element_type: String,
    /// Resource id
    pub id: Option<String>,
    /// Text label
    pub text: Option<String>,
    /// Placeholder text for input elements
    pub placeholder: Option<String>,
    /// Accessibility identifier
    pub accessibility_id: Option<String>,
    /// Can be checked
    pub checkable: bool,
    /// Reacts to taps
    pub clickable: bool,
    /// Can take focus
    pub focusable: bool,
    /// Reacts to long presses
    pub long_clickable: bool,
    /// Scrolls its content
    pub scrollable: bool,
    /// Currently checked
    pub checked: bool,
    /// Currently focused
    pub focused: bool,
    /// Password input
    pub password: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Bounding box
    #[serde(flatten)]
    pub bounds: Rect,
    /// Important for accessibility, when reported
    pub important: Option<bool>,
    /// Child elements, in document order
    pub children: Vec<Element>,
}

impl Element {
    /// Whether the element carries the given text label
    #[must_use]
    pub fn has_text(&self, text: &str) -> bool {
        self.text.as_deref() == Some(text)
    }

    /// Whether the element has no children
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of elements in this subtree, including `self`
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        self.descendants().count()
    }

    /// Short human readable label: type plus the first identifying attribute
    #[must_use]
    pub fn label(&self) -> String {
        let detail = self
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| format!("text={t:?}"))
            .or_else(|| {
                self.id
                    .as_deref()
                    .filter(|id| !id.is_empty())
                    .map(|id| format!("id={id:?}"))
            })
            .or_else(|| {
                self.accessibility_id
                    .as_deref()
                    .filter(|a| !a.is_empty())
                    .map(|a| format!("accessibilityId={a:?}"))
            });
        match detail {
            Some(detail) => format!("{} [{detail}]", self.element_type),
            None => self.element_type.clone(),
        }
    }
}

/// One top-level UI surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Window category
    #[serde(rename = "type")]
    pub kind: WindowKind,
    /// Package (bundle) that owns the window
    pub package_name: String,
    /// Bounding box
    #[serde(flatten)]
    pub bounds: Rect,
    /// Root of the view hierarchy
    pub root: Element,
}

/// A parsed snapshot of the device UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    /// Session that produced the snapshot, may be empty
    pub session_id: String,
    /// Device operating system
    #[serde(rename = "osType")]
    pub os: OsKind,
    /// Windows composing the screen
    pub windows: Vec<Window>,
}

impl Tree {
    /// Create an empty tree
    #[must_use]
    pub fn new(session_id: impl Into<String>, os: OsKind) -> Self {
        Self {
            session_id: session_id.into(),
            os,
            windows: Vec::new(),
        }
    }

    /// First window of the given kind
    #[must_use]
    pub fn window(&self, kind: WindowKind) -> Option<&Window> {
        self.windows.iter().find(|w| w.kind == kind)
    }

    /// Total number of elements across all windows
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements().count()
    }
}

impl std::str::FromStr for Tree {
    type Err = crate::result::TreeParsingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parser::parse_tree(s)
    }
}
