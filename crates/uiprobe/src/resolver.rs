//! Resilient element resolution.
//!
//! Lookups against a live device are racy: the element may not be rendered
//! yet, may still be animating, or may be on its way out. The resolver polls
//! the session until the wanted state is observed or the deadline passes.
//!
//! ```text
//!            lookup
//!  Searching ───────► Found ──(stability requested)──► Settling ──► Stable
//!      │                                                  │
//!      └── deadline ──► NotFound              deadline ───┴──► NotStable
//!                                           vanished ────────► Disappeared
//! ```
//!
//! Only [`Lookup::NotFound`] is absorbed by the polling loop. Any
//! [`SessionError`](crate::result::SessionError) aborts the wait at once.

use crate::geometry::Rect;
use crate::result::{ProbeError, ProbeResult};
use crate::selector::{ElementPredicate, NodePosition, Selector};
use crate::session::{DeviceSession, ElementRef, Lookup};
use crate::telemetry::{EventLevel, Telemetry, TelemetryEvent};
use crate::tree::model::Element;
use crate::tree::parser::parse_tree;
use crate::wait::{Deadline, RetryOptions, WaitOptions};
use std::collections::HashMap;
use tokio::time::Instant;

/// Polls a [`DeviceSession`] for elements
pub struct ElementResolver<'a, S: DeviceSession + ?Sized> {
    session: &'a S,
    telemetry: &'a dyn Telemetry,
}

impl<S: DeviceSession + ?Sized> std::fmt::Debug for ElementResolver<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementResolver").finish_non_exhaustive()
    }
}

impl<'a, S: DeviceSession + ?Sized> ElementResolver<'a, S> {
    /// Create a resolver over borrowed collaborators
    pub fn new(session: &'a S, telemetry: &'a dyn Telemetry) -> Self {
        Self { session, telemetry }
    }

    /// Wait until the session can resolve `selector`.
    ///
    /// With `wait_for_stability` set, additionally waits until two
    /// consecutive observations of the element's box are equal. Both phases
    /// share one deadline.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::NotFound`] if nothing matched before the deadline
    /// - [`ProbeError::NotStable`] if the element kept moving
    /// - [`ProbeError::Disappeared`] if it vanished while settling
    /// - [`ProbeError::Session`] for any session failure
    pub async fn wait_for_element(
        &self,
        selector: &Selector,
        options: &WaitOptions,
    ) -> ProbeResult<ElementRef> {
        check_poll_interval(options)?;
        let payload = wait_payload(selector, options);
        self.notify(
            TelemetryEvent::new(
                EventLevel::Debug,
                format!("Waiting for element with {selector} to show up"),
            )
            .with_payload(payload.clone()),
        )
        .await;

        let start = Instant::now();
        let deadline = Deadline::after(options.timeout_ms);
        let outcome = match self.search(selector, options, &deadline).await {
            Ok(_) if options.wait_for_stability => self.settle(selector, options, &deadline).await,
            other => other,
        };

        match &outcome {
            Ok(element) => {
                tracing::debug!(
                    criteria = %selector,
                    element = %element.id,
                    elapsed_ms = elapsed_ms(start),
                    "element resolved"
                );
                self.notify(
                    TelemetryEvent::new(EventLevel::Debug, format!("Found element {selector}"))
                        .with_payload(payload),
                )
                .await;
            }
            Err(err) => {
                let message = match err {
                    ProbeError::NotStable { .. } => {
                        format!("Element with {selector} was still not stable")
                    }
                    ProbeError::Disappeared { .. } => {
                        format!("Element with {selector} disappeared while settling")
                    }
                    _ => format!("Could not find element with {selector}"),
                };
                self.notify(
                    TelemetryEvent::new(EventLevel::Error, message)
                        .with_payload(payload)
                        .with_field("error", err.to_string()),
                )
                .await;
            }
        }
        outcome
    }

    /// Wait until the session no longer resolves `selector`.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::StillPresent`] if the element outlived the deadline
    /// - [`ProbeError::Session`] for any session failure
    pub async fn wait_for_element_gone(
        &self,
        selector: &Selector,
        options: &WaitOptions,
    ) -> ProbeResult<()> {
        check_poll_interval(options)?;
        let payload = wait_payload(selector, options);
        self.notify(
            TelemetryEvent::new(
                EventLevel::Debug,
                format!("Waiting for element with {selector} to disappear"),
            )
            .with_payload(payload.clone()),
        )
        .await;

        let deadline = Deadline::after(options.timeout_ms);
        let outcome = self.vanish(selector, options, &deadline).await;

        let event = match &outcome {
            Ok(()) => TelemetryEvent::new(EventLevel::Debug, format!("Element {selector} is gone"))
                .with_payload(payload),
            Err(err) => TelemetryEvent::new(
                EventLevel::Error,
                format!("Element with {selector} was still present"),
            )
            .with_payload(payload)
            .with_field("error", err.to_string()),
        };
        self.notify(event).await;
        outcome
    }

    /// Find the element accepted by `predicate` at `position` in a fresh tree.
    ///
    /// Every attempt re-reads and re-parses the full snapshot.
    ///
    /// # Errors
    ///
    /// - [`ProbeError::NodeNotFound`] once all attempts came up empty
    /// - [`ProbeError::TreeParsing`] or [`ProbeError::Session`] immediately,
    ///   without consuming an attempt
    pub async fn find_node(
        &self,
        predicate: &dyn ElementPredicate,
        position: NodePosition,
        retry: &RetryOptions,
    ) -> ProbeResult<Element> {
        let description = predicate.describe();
        let attempts = retry.retries.max(1);
        let payload = node_payload(&description, position, attempts, retry);
        self.notify(
            TelemetryEvent::new(
                EventLevel::Debug,
                format!("Looking for node matching {description} at position {position}"),
            )
            .with_payload(payload.clone()),
        )
        .await;

        for attempt in 1..=attempts {
            let tree = parse_tree(&self.session.page_source().await?)?;
            let matches = tree.find(|e| predicate.matches(e));
            tracing::trace!(
                predicate = %description,
                attempt,
                matches = matches.len(),
                "node lookup"
            );
            if let Some(element) = position.select(&matches) {
                self.notify(
                    TelemetryEvent::new(
                        EventLevel::Debug,
                        format!("Found node matching {description} at position {position}"),
                    )
                    .with_payload(payload)
                    .with_field("attempt", attempt),
                )
                .await;
                return Ok((*element).clone());
            }
            if attempt < attempts {
                tokio::time::sleep(retry.delay()).await;
            }
        }

        let err = ProbeError::NodeNotFound {
            predicate: description,
            position,
            attempts,
            delay_ms: retry.delay_ms,
        };
        self.notify(
            TelemetryEvent::new(EventLevel::Error, err.to_string()).with_payload(payload),
        )
        .await;
        Err(err)
    }

    async fn search(
        &self,
        selector: &Selector,
        options: &WaitOptions,
        deadline: &Deadline,
    ) -> ProbeResult<ElementRef> {
        let mut attempt: u32 = 1;
        loop {
            let lookup = self.session.find_element(selector).await?;
            tracing::trace!(
                criteria = %selector,
                attempt,
                found = matches!(lookup, Lookup::Found(_)),
                "element lookup"
            );
            if deadline.has_passed() {
                break;
            }
            if let Some(element) = lookup.found() {
                return Ok(element);
            }
            deadline.sleep(options.poll_interval()).await;
            if deadline.has_passed() {
                break;
            }
            attempt = attempt.saturating_add(1);
        }
        Err(ProbeError::NotFound {
            criteria: selector.to_string(),
            timeout_ms: options.timeout_ms,
            poll_interval_ms: options.poll_interval_ms,
        })
    }

    async fn settle(
        &self,
        selector: &Selector,
        options: &WaitOptions,
        deadline: &Deadline,
    ) -> ProbeResult<ElementRef> {
        let mut last: Option<Rect> = None;
        loop {
            if deadline.has_passed() {
                break;
            }
            let element = match self.session.find_element(selector).await? {
                Lookup::Found(current) => current,
                Lookup::NotFound => {
                    return Err(ProbeError::Disappeared {
                        criteria: selector.to_string(),
                        timeout_ms: options.timeout_ms,
                        poll_interval_ms: options.poll_interval_ms,
                    });
                }
            };
            let rect = self.session.element_rect(&element).await?;
            tracing::trace!(criteria = %selector, ?rect, "element geometry");
            if deadline.has_passed() {
                break;
            }
            if last == Some(rect) {
                return Ok(element);
            }
            last = Some(rect);
            deadline.sleep(options.poll_interval()).await;
        }
        Err(ProbeError::NotStable {
            criteria: selector.to_string(),
            timeout_ms: options.timeout_ms,
            poll_interval_ms: options.poll_interval_ms,
        })
    }

    async fn vanish(
        &self,
        selector: &Selector,
        options: &WaitOptions,
        deadline: &Deadline,
    ) -> ProbeResult<()> {
        loop {
            let lookup = self.session.find_element(selector).await?;
            if deadline.has_passed() {
                break;
            }
            if lookup == Lookup::NotFound {
                return Ok(());
            }
            deadline.sleep(options.poll_interval()).await;
            if deadline.has_passed() {
                break;
            }
        }
        Err(ProbeError::StillPresent {
            criteria: selector.to_string(),
            timeout_ms: options.timeout_ms,
            poll_interval_ms: options.poll_interval_ms,
        })
    }

    async fn notify(&self, event: TelemetryEvent) {
        if let Err(err) = self.telemetry.emit(&event).await {
            tracing::warn!(error = %err, message = %event.message, "telemetry event dropped");
        }
    }
}

fn check_poll_interval(options: &WaitOptions) -> ProbeResult<()> {
    if options.poll_interval_ms == 0 {
        return Err(ProbeError::invalid_argument(
            "poll interval must be greater than zero",
        ));
    }
    Ok(())
}

fn wait_payload(selector: &Selector, options: &WaitOptions) -> HashMap<String, serde_json::Value> {
    HashMap::from([
        ("timeout".to_string(), options.timeout_ms.into()),
        ("delay".to_string(), options.poll_interval_ms.into()),
        ("property".to_string(), selector.property.clone().into()),
        ("value".to_string(), selector.value.clone().into()),
    ])
}

fn node_payload(
    description: &str,
    position: NodePosition,
    attempts: u32,
    retry: &RetryOptions,
) -> HashMap<String, serde_json::Value> {
    HashMap::from([
        ("predicate".to_string(), description.into()),
        ("position".to_string(), position.to_string().into()),
        ("retries".to_string(), attempts.into()),
        ("delay".to_string(), retry.delay_ms.into()),
    ])
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
