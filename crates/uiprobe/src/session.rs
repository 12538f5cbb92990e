//! Device session abstraction.
//!
//! The session is the remote-automation endpoint (WebDriver-style) that owns
//! the device. Transport, capabilities and session lifecycle live outside
//! this crate; everything here talks to a [`DeviceSession`].

use crate::geometry::{Rect, Size};
use crate::gesture::ActionSequence;
use crate::result::SessionError;
use crate::selector::Selector;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Opaque handle to an element resolved by the session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Session-assigned element id
    pub id: String,
}

impl ElementRef {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Outcome of a native element lookup.
///
/// "No such element" is an expected outcome while polling, so it is a value
/// rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The element exists
    Found(ElementRef),
    /// No element matched
    NotFound,
}

impl Lookup {
    /// The element handle, if found
    #[must_use]
    pub fn found(self) -> Option<ElementRef> {
        match self {
            Self::Found(element) => Some(element),
            Self::NotFound => None,
        }
    }
}

/// Raw screenshot returned by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// PNG bytes
    pub data: Vec<u8>,
}

impl Screenshot {
    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    /// Wrap raw bytes
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether the data starts with the PNG signature
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.data.starts_with(&Self::PNG_MAGIC)
    }
}

/// Remote device session
#[async_trait]
pub trait DeviceSession: Send + Sync {
    /// Current UI snapshot document
    async fn page_source(&self) -> Result<String, SessionError>;

    /// Native element lookup
    async fn find_element(&self, selector: &Selector) -> Result<Lookup, SessionError>;

    /// Current bounding box of a resolved element
    async fn element_rect(&self, element: &ElementRef) -> Result<Rect, SessionError>;

    /// Click a resolved element
    async fn click_element(&self, element: &ElementRef) -> Result<(), SessionError>;

    /// Replace the value of a resolved input element
    async fn set_value(&self, element: &ElementRef, text: &str) -> Result<(), SessionError>;

    /// Perform pointer action sequences
    async fn perform_actions(&self, actions: &[ActionSequence]) -> Result<(), SessionError>;

    /// Screen dimensions
    async fn window_size(&self) -> Result<Size, SessionError>;

    /// Capture the screen
    async fn screenshot(&self) -> Result<Screenshot, SessionError>;
}

/// Response queue where the last scripted entry keeps being returned
#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<T>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    page_sources: Script<Result<String, SessionError>>,
    lookups: Script<Result<Lookup, SessionError>>,
    rects: Script<Result<Rect, SessionError>>,
    window_size: Option<Size>,
    screenshot: Option<Screenshot>,
    performed: Vec<ActionSequence>,
    call_history: Vec<String>,
}

/// Scripted session for unit testing.
///
/// Each `push_*` call appends one response; once a queue is down to its last
/// response that response repeats. Unscripted lookups report
/// [`Lookup::NotFound`].
#[derive(Debug, Default)]
pub struct MockSession {
    state: Mutex<MockState>,
}

impl MockSession {
    /// Create new mock session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn record(&self, call: String) {
        self.with_state(|s| s.call_history.push(call));
    }

    /// Script a page source response
    #[must_use]
    pub fn with_page_source(self, source: impl Into<String>) -> Self {
        self.push_page_source(Ok(source.into()));
        self
    }

    /// Script a lookup response
    #[must_use]
    pub fn with_lookup(self, lookup: Lookup) -> Self {
        self.push_lookup(Ok(lookup));
        self
    }

    /// Script an element rect response
    #[must_use]
    pub fn with_rect(self, rect: Rect) -> Self {
        self.push_rect(Ok(rect));
        self
    }

    /// Set the screen dimensions
    #[must_use]
    pub fn with_window_size(self, size: Size) -> Self {
        self.with_state(|s| s.window_size = Some(size));
        self
    }

    /// Set the screenshot returned by the session
    #[must_use]
    pub fn with_screenshot(self, screenshot: Screenshot) -> Self {
        self.with_state(|s| s.screenshot = Some(screenshot));
        self
    }

    /// Append a page source response
    pub fn push_page_source(&self, response: Result<String, SessionError>) {
        self.with_state(|s| s.page_sources.queue.push_back(response));
    }

    /// Append a lookup response
    pub fn push_lookup(&self, response: Result<Lookup, SessionError>) {
        self.with_state(|s| s.lookups.queue.push_back(response));
    }

    /// Append an element rect response
    pub fn push_rect(&self, response: Result<Rect, SessionError>) {
        self.with_state(|s| s.rects.queue.push_back(response));
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.with_state(|s| s.call_history.clone())
    }

    /// Number of calls whose entry starts with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.with_state(|s| s.call_history.iter().filter(|c| c.starts_with(method)).count())
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_count(method) > 0
    }

    /// Action sequences performed so far
    #[must_use]
    pub fn performed_actions(&self) -> Vec<ActionSequence> {
        self.with_state(|s| s.performed.clone())
    }
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn page_source(&self) -> Result<String, SessionError> {
        self.record("page_source".to_string());
        self.with_state(|s| s.page_sources.next())
            .unwrap_or_else(|| Err(SessionError::protocol("getPageSource", "No mock page source set")))
    }

    async fn find_element(&self, selector: &Selector) -> Result<Lookup, SessionError> {
        self.record(format!("find_element:{selector}"));
        self.with_state(|s| s.lookups.next())
            .unwrap_or(Ok(Lookup::NotFound))
    }

    async fn element_rect(&self, element: &ElementRef) -> Result<Rect, SessionError> {
        self.record(format!("element_rect:{}", element.id));
        self.with_state(|s| s.rects.next())
            .unwrap_or(Ok(Rect::default()))
    }

    async fn click_element(&self, element: &ElementRef) -> Result<(), SessionError> {
        self.record(format!("click_element:{}", element.id));
        Ok(())
    }

    async fn set_value(&self, element: &ElementRef, text: &str) -> Result<(), SessionError> {
        self.record(format!("set_value:{}:{text}", element.id));
        Ok(())
    }

    async fn perform_actions(&self, actions: &[ActionSequence]) -> Result<(), SessionError> {
        self.record(format!("perform_actions:{}", actions.len()));
        self.with_state(|s| s.performed.extend_from_slice(actions));
        Ok(())
    }

    async fn window_size(&self) -> Result<Size, SessionError> {
        self.record("window_size".to_string());
        self.with_state(|s| s.window_size)
            .ok_or_else(|| SessionError::protocol("getWindowRect", "No mock window size set"))
    }

    async fn screenshot(&self) -> Result<Screenshot, SessionError> {
        self.record("screenshot".to_string());
        self.with_state(|s| s.screenshot.clone())
            .ok_or_else(|| SessionError::protocol("takeScreenshot", "No mock screenshot set"))
    }
}
