//! uiprobe: UI-tree acquisition and resilient element resolution for remote
//! mobile devices.
//!
//! A device session hands out attribute-only snapshots of the screen. This
//! crate turns them into a validated [`Tree`], queries it, and drives the
//! device through a polling resolution engine that tells "not there yet"
//! apart from real failures.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  page_source   ┌────────────┐     ┌─────────────┐
//! │ DeviceSession   │───────────────►│ tree::     │────►│ tree::query │
//! │ (remote)        │                │ parser     │     │ find/filter │
//! └────────┬────────┘                └────────────┘     └──────┬──────┘
//!          │ find_element / element_rect                       │
//!          ▼                                                   ▼
//! ┌─────────────────┐  wait / retry / stability  ┌──────────────────────┐
//! │ ElementResolver │◄───────────────────────────│ DeviceController     │
//! └─────────────────┘                            │ tap / type / swipe   │
//!                                                └──────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use uiprobe::prelude::*;
//!
//! let tree: Tree = r#"<tree sessionId="s-1" osType="android"></tree>"#.parse()?;
//! assert_eq!(tree.os, OsKind::Android);
//! assert!(tree.find(|e| e.clickable).is_empty());
//! # Ok::<(), uiprobe::TreeParsingError>(())
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod config;
pub mod controller;
pub mod geometry;
pub mod gesture;
pub mod resolver;
mod result;
pub mod selector;
pub mod session;
pub mod telemetry;
pub mod tree;
pub mod wait;

pub use config::ProbeConfig;
pub use controller::DeviceController;
pub use geometry::{Point, Rect, Size};
pub use gesture::{ActionSequence, GestureTimings, PointerAction, SwipeDirection};
pub use resolver::ElementResolver;
pub use result::{ParseCause, ProbeError, ProbeResult, SessionError, TreeParsingError};
pub use selector::{ElementPredicate, FnPredicate, Matcher, NodePosition, Selector};
pub use session::{DeviceSession, ElementRef, Lookup, MockSession, Screenshot};
pub use telemetry::{EventLevel, RecordingTelemetry, Telemetry, TelemetryEvent, TracingTelemetry};
pub use tree::{parse_tree, parse_tree_bytes, Element, OsKind, Tree, Visibility, Window, WindowKind};
pub use wait::{Deadline, RetryOptions, WaitOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::config::*;
    pub use super::controller::*;
    pub use super::geometry::*;
    pub use super::gesture::*;
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::selector::*;
    pub use super::session::*;
    pub use super::telemetry::*;
    pub use super::tree::*;
    pub use super::wait::*;
}
