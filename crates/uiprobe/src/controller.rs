//! Device controller: the command surface used by test scripts.
//!
//! # Example
//!
//! ```ignore
//! let controller = DeviceController::new(session)
//!     .with_config(ProbeConfig::load("uiprobe.yaml")?);
//!
//! controller.tap_element(&Selector::accessibility_id("sign-in"), None).await?;
//! controller
//!     .tap_element_with(&Matcher::Text("Trip plan".into()), NodePosition::First, None)
//!     .await?;
//! controller.swipe_screen(SwipeDirection::Vertical, 80, 20).await?;
//! ```

use crate::config::ProbeConfig;
use crate::geometry::{Point, Rect};
use crate::gesture::{swipe_points, swipe_sequence, tap_sequence, SwipeDirection};
use crate::resolver::ElementResolver;
use crate::result::ProbeResult;
use crate::selector::{ElementPredicate, NodePosition, Selector};
use crate::session::{DeviceSession, ElementRef};
use crate::telemetry::{EventLevel, Telemetry, TelemetryEvent, TracingTelemetry};
use crate::tree::model::{Element, Tree};
use crate::tree::parser::parse_tree;
use crate::wait::{RetryOptions, WaitOptions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Runs commands against one device session
pub struct DeviceController<S: DeviceSession> {
    session: S,
    telemetry: Box<dyn Telemetry>,
    config: ProbeConfig,
}

impl<S: DeviceSession> std::fmt::Debug for DeviceController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: DeviceSession> DeviceController<S> {
    /// Create controller with default config, logging telemetry to `tracing`
    pub fn new(session: S) -> Self {
        Self {
            session,
            telemetry: Box::new(TracingTelemetry),
            config: ProbeConfig::default(),
        }
    }

    /// Replace the telemetry sink
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Box<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Replace the configuration
    #[must_use]
    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Get the underlying session
    #[must_use]
    pub const fn session(&self) -> &S {
        &self.session
    }

    fn resolver(&self) -> ElementResolver<'_, S> {
        ElementResolver::new(&self.session, self.telemetry.as_ref())
    }

    fn wait_options(&self, options: Option<WaitOptions>) -> WaitOptions {
        options.unwrap_or_else(|| self.config.default_wait())
    }

    // =========================================================================
    // ELEMENT COMMANDS
    // =========================================================================

    /// Wait until `selector` resolves
    ///
    /// # Errors
    ///
    /// See [`ElementResolver::wait_for_element`].
    pub async fn wait_for_element(
        &self,
        selector: &Selector,
        options: Option<WaitOptions>,
    ) -> ProbeResult<ElementRef> {
        self.resolver()
            .wait_for_element(selector, &self.wait_options(options))
            .await
    }

    /// Wait until `selector` no longer resolves
    ///
    /// # Errors
    ///
    /// See [`ElementResolver::wait_for_element_gone`].
    pub async fn wait_for_element_gone(
        &self,
        selector: &Selector,
        options: Option<WaitOptions>,
    ) -> ProbeResult<()> {
        self.resolver()
            .wait_for_element_gone(selector, &self.wait_options(options))
            .await
    }

    /// Resolve `selector` and click it
    ///
    /// # Errors
    ///
    /// Any resolution failure, or the session's click failure.
    pub async fn tap_element(
        &self,
        selector: &Selector,
        options: Option<WaitOptions>,
    ) -> ProbeResult<ElementRef> {
        let element = self.wait_for_element(selector, options).await?;
        tracing::debug!(criteria = %selector, element = %element.id, "tap element");
        self.session.click_element(&element).await?;
        Ok(element)
    }

    /// Resolve `selector`, focus it and replace its value with `text`
    ///
    /// # Errors
    ///
    /// Any resolution failure, or the session's click or input failure.
    pub async fn type_in_element(
        &self,
        selector: &Selector,
        text: &str,
        options: Option<WaitOptions>,
    ) -> ProbeResult<ElementRef> {
        let element = self.wait_for_element(selector, options).await?;
        tracing::debug!(criteria = %selector, chars = text.chars().count(), "type in element");
        self.session.click_element(&element).await?;
        self.session.set_value(&element, text).await?;
        Ok(element)
    }

    /// Find a node in fresh trees and tap the centre of its box
    ///
    /// # Errors
    ///
    /// See [`ElementResolver::find_node`], plus the session's action failure.
    pub async fn tap_element_with(
        &self,
        predicate: &dyn ElementPredicate,
        position: NodePosition,
        retry: Option<RetryOptions>,
    ) -> ProbeResult<Element> {
        let retry = retry.unwrap_or_else(|| self.config.default_retry());
        let element = self.resolver().find_node(predicate, position, &retry).await?;
        self.tap_center_of_box(element.bounds).await?;
        Ok(element)
    }

    // =========================================================================
    // GESTURES
    // =========================================================================

    /// Tap at absolute screen coordinates
    ///
    /// # Errors
    ///
    /// Returns the session's action failure.
    pub async fn tap(&self, x: u32, y: u32) -> ProbeResult<()> {
        tracing::debug!(x, y, "tap");
        let sequence = tap_sequence(Point::new(x, y), &self.config.gestures);
        self.session.perform_actions(&[sequence]).await?;
        Ok(())
    }

    /// Tap the centre of `rect`
    ///
    /// # Errors
    ///
    /// Returns the session's action failure.
    pub async fn tap_center_of_box(&self, rect: Rect) -> ProbeResult<()> {
        let center = rect.center();
        self.tap(center.x, center.y).await
    }

    /// Swipe across the screen between two percentages of its extent
    ///
    /// # Errors
    ///
    /// [`ProbeError::InvalidArgument`](crate::ProbeError::InvalidArgument)
    /// for percentages above 100, or the session's failure.
    pub async fn swipe_screen(
        &self,
        direction: SwipeDirection,
        from_percent: u32,
        to_percent: u32,
    ) -> ProbeResult<()> {
        let screen = self.session.window_size().await?;
        let (from, to) = swipe_points(direction, screen, from_percent, to_percent)?;
        tracing::debug!(?direction, ?from, ?to, "swipe");
        let sequence = swipe_sequence(from, to, &self.config.gestures);
        self.session.perform_actions(&[sequence]).await?;
        Ok(())
    }

    // =========================================================================
    // CAPTURE
    // =========================================================================

    /// Save a screenshot and return where it was written.
    ///
    /// Relative paths land under the configured screenshot directory of the
    /// current working directory. Missing directories are created.
    ///
    /// # Errors
    ///
    /// Returns the session's failure or any I/O failure.
    pub async fn screenshot(&self, path: impl AsRef<Path>) -> ProbeResult<PathBuf> {
        let target = self.screenshot_path(path.as_ref())?;
        let shot = self.session.screenshot().await?;
        if !shot.is_png() {
            tracing::warn!(bytes = shot.size_bytes(), "screenshot data is not PNG");
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &shot.data).await?;
        tracing::info!(path = %target.display(), bytes = shot.size_bytes(), "saved screenshot");
        Ok(target)
    }

    fn screenshot_path(&self, path: &Path) -> ProbeResult<PathBuf> {
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        Ok(std::env::current_dir()?
            .join(&self.config.screenshot_dir)
            .join(path))
    }

    /// Fetch and parse the current UI tree
    ///
    /// # Errors
    ///
    /// Returns the session's failure or the parse error.
    pub async fn get_tree(&self) -> ProbeResult<Tree> {
        let source = self.session.page_source().await?;
        let tree = parse_tree(&source)?;
        tracing::debug!(
            windows = tree.windows.len(),
            elements = tree.element_count(),
            "fetched tree"
        );
        Ok(tree)
    }

    /// Elements of a fresh tree accepted by `predicate`
    ///
    /// # Errors
    ///
    /// Returns the session's failure or the parse error.
    pub async fn get_nodes(&self, predicate: &dyn ElementPredicate) -> ProbeResult<Vec<Element>> {
        let tree = self.get_tree().await?;
        Ok(tree
            .find(|e| predicate.matches(e))
            .into_iter()
            .cloned()
            .collect())
    }

    /// Publish a timeline entry
    ///
    /// # Errors
    ///
    /// Returns the telemetry sink's failure.
    pub async fn log(
        &self,
        message: &str,
        payload: HashMap<String, serde_json::Value>,
        level: EventLevel,
    ) -> ProbeResult<()> {
        let event = TelemetryEvent::new(level, message).with_payload(payload);
        self.telemetry.emit(&event).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::gesture::PointerAction;
    use crate::result::{ProbeError, SessionError};
    use crate::selector::Matcher;
    use crate::session::{Lookup, MockSession, Screenshot};
    use crate::telemetry::RecordingTelemetry;
    use std::sync::Arc;

    const NOTES: &str = include_str!("../fixtures/android_notes.xml");

    fn first_move(session: &MockSession) -> (u32, u32) {
        let actions = session.performed_actions();
        match actions.last().and_then(|seq| seq.actions.first()) {
            Some(PointerAction::Move { x, y, .. }) => (*x, *y),
            other => panic!("expected a pointer move, got {other:?}"),
        }
    }

    mod element_command_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_tap_element_clicks_resolved_handle() {
            let session = MockSession::new().with_lookup(Lookup::Found(ElementRef::new("el-3")));
            let controller = DeviceController::new(session);
            let element = controller
                .tap_element(&Selector::accessibility_id("sign-in"), None)
                .await
                .unwrap();
            assert_eq!(element.id, "el-3");
            assert!(controller.session().was_called("click_element:el-3"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_type_in_element_clicks_then_sets_value() {
            let session = MockSession::new().with_lookup(Lookup::Found(ElementRef::new("email")));
            let controller = DeviceController::new(session);
            controller
                .type_in_element(&Selector::id("email"), "a@b.c", None)
                .await
                .unwrap();
            let history = controller.session().history();
            let click = history.iter().position(|c| c == "click_element:email").unwrap();
            let set = history.iter().position(|c| c == "set_value:email:a@b.c").unwrap();
            assert!(click < set);
        }

        #[tokio::test(start_paused = true)]
        async fn test_not_found_skips_click() {
            let controller = DeviceController::new(MockSession::new());
            let err = controller
                .tap_element(
                    &Selector::id("ghost"),
                    Some(WaitOptions::new().with_timeout(1000)),
                )
                .await
                .unwrap_err();
            assert!(err.is_not_found());
            assert!(!controller.session().was_called("click_element"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_config_supplies_default_wait() {
            let config = ProbeConfig::new().with_wait(WaitOptions::new().with_timeout(700));
            let controller = DeviceController::new(MockSession::new()).with_config(config);
            let start = tokio::time::Instant::now();
            let err = controller
                .wait_for_element(&Selector::id("x"), None)
                .await
                .unwrap_err();
            assert_eq!(start.elapsed(), std::time::Duration::from_millis(700));
            assert!(err.to_string().contains("700ms"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_wait_for_element_gone() {
            let session = MockSession::new().with_lookup(Lookup::NotFound);
            let controller = DeviceController::new(session);
            assert!(controller
                .wait_for_element_gone(&Selector::id("spinner"), None)
                .await
                .is_ok());
        }
    }

    mod predicate_command_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_tap_element_with_taps_centre() {
            let session = MockSession::new().with_page_source(NOTES);
            let controller = DeviceController::new(session);
            let element = controller
                .tap_element_with(
                    &Matcher::AccessibilityId("[delete]".into()),
                    NodePosition::First,
                    None,
                )
                .await
                .unwrap();
            assert_eq!(element.bounds, Rect::new(996, 242, 84, 84));
            assert_eq!(first_move(controller.session()), (1038, 284));
        }

        #[tokio::test(start_paused = true)]
        async fn test_tap_element_with_exhausts_retries() {
            let session = MockSession::new().with_page_source(NOTES);
            let controller = DeviceController::new(session);
            let err = controller
                .tap_element_with(
                    &Matcher::Text("Nowhere".into()),
                    NodePosition::default(),
                    Some(RetryOptions::new().with_retries(2).with_delay(100)),
                )
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::NodeNotFound { attempts: 2, .. }));
            assert!(!controller.session().was_called("perform_actions"));
        }

        #[tokio::test]
        async fn test_get_tree_and_nodes() {
            let session = MockSession::new().with_page_source(NOTES);
            let controller = DeviceController::new(session);
            let tree = controller.get_tree().await.unwrap();
            assert_eq!(tree.element_count(), 21);

            let nodes = controller.get_nodes(&Matcher::Clickable(true)).await.unwrap();
            assert_eq!(nodes.len(), 4);
        }

        #[tokio::test]
        async fn test_get_tree_parse_error() {
            let session = MockSession::new().with_page_source("<hierarchy/>");
            let controller = DeviceController::new(session);
            let err = controller.get_tree().await.unwrap_err();
            assert!(matches!(err, ProbeError::TreeParsing(_)));
        }
    }

    mod gesture_command_tests {
        use super::*;

        #[tokio::test]
        async fn test_tap_center_of_box_rounds_half_up() {
            let controller = DeviceController::new(MockSession::new());
            controller
                .tap_center_of_box(Rect::new(0, 361, 1080, 105))
                .await
                .unwrap();
            assert_eq!(first_move(controller.session()), (540, 414));
        }

        #[tokio::test]
        async fn test_swipe_screen_vertical() {
            let session = MockSession::new().with_window_size(Size::new(1080, 2400));
            let controller = DeviceController::new(session);
            controller
                .swipe_screen(SwipeDirection::Vertical, 80, 20)
                .await
                .unwrap();
            let actions = &controller.session().performed_actions()[0].actions;
            assert_eq!(actions.len(), 5);
            assert_eq!(
                actions[3],
                PointerAction::Move {
                    x: 540,
                    y: 480,
                    duration_ms: 50
                }
            );
        }

        #[tokio::test]
        async fn test_swipe_screen_rejects_bad_percent() {
            let session = MockSession::new().with_window_size(Size::new(1080, 2400));
            let controller = DeviceController::new(session);
            let err = controller
                .swipe_screen(SwipeDirection::Horizontal, 0, 150)
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::InvalidArgument { .. }));
            assert!(controller.session().performed_actions().is_empty());
        }

        #[tokio::test]
        async fn test_configured_gesture_timings() {
            let mut config = ProbeConfig::new();
            config.gestures.tap_pause_ms = 250;
            let controller = DeviceController::new(MockSession::new()).with_config(config);
            controller.tap(5, 5).await.unwrap();
            let actions = &controller.session().performed_actions()[0].actions;
            assert_eq!(actions[2], PointerAction::Pause { duration_ms: 250 });
        }
    }

    mod capture_tests {
        use super::*;

        #[tokio::test]
        async fn test_screenshot_into_configured_dir() {
            let dir = tempfile::tempdir().unwrap();
            let shots = dir.path().join("nested").join("shots");
            let session = MockSession::new().with_screenshot(Screenshot::new(vec![1, 2, 3]));
            let controller = DeviceController::new(session)
                .with_config(ProbeConfig::new().with_screenshot_dir(&shots));

            let written = controller.screenshot("login.png").await.unwrap();
            assert_eq!(written, shots.join("login.png"));
            assert_eq!(std::fs::read(&written).unwrap(), vec![1, 2, 3]);
        }

        #[tokio::test]
        async fn test_screenshot_absolute_path() {
            let dir = tempfile::tempdir().unwrap();
            let target = dir.path().join("a").join("b.png");
            let session = MockSession::new().with_screenshot(Screenshot::new(vec![9]));
            let controller = DeviceController::new(session);
            let written = controller.screenshot(&target).await.unwrap();
            assert_eq!(written, target);
            assert!(target.exists());
        }

        #[tokio::test]
        async fn test_screenshot_session_failure() {
            let dir = tempfile::tempdir().unwrap();
            let controller = DeviceController::new(MockSession::new());
            let err = controller
                .screenshot(dir.path().join("x.png"))
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Session(_)));
        }
    }

    mod log_tests {
        use super::*;

        #[tokio::test]
        async fn test_log_forwards_to_telemetry() {
            let telemetry = Arc::new(RecordingTelemetry::new());
            let controller =
                DeviceController::new(MockSession::new()).with_telemetry(Box::new(Arc::clone(&telemetry)));
            let payload = HashMap::from([("step".to_string(), serde_json::json!("login"))]);
            controller
                .log("Starting login", payload, EventLevel::Info)
                .await
                .unwrap();

            let events = telemetry.events();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].message, "Starting login");
            assert_eq!(events[0].level, EventLevel::Info);
            assert_eq!(events[0].payload["step"], "login");
        }

        #[tokio::test]
        async fn test_log_propagates_sink_failure() {
            let telemetry = RecordingTelemetry::failing(SessionError::transport("down"));
            let controller =
                DeviceController::new(MockSession::new()).with_telemetry(Box::new(telemetry));
            let err = controller
                .log("x", HashMap::new(), EventLevel::Debug)
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::Session(_)));
        }
    }
}
