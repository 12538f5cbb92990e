//! Timeline telemetry emitted while commands run.

use crate::result::SessionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warning level
    Warn,
    /// Error level
    Error,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Severity
    pub level: EventLevel,
    /// Message
    pub message: String,
    /// Structured payload
    pub payload: HashMap<String, serde_json::Value>,
    /// Wall clock time of the event
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    /// Create a new event stamped with the current time
    #[must_use]
    pub fn new(level: EventLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            payload: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    /// Add a payload field
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Replace the payload
    #[must_use]
    pub fn with_payload(mut self, payload: HashMap<String, serde_json::Value>) -> Self {
        self.payload = payload;
        self
    }
}

/// Destination for timeline events
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Publish one event
    async fn emit(&self, event: &TelemetryEvent) -> Result<(), SessionError>;
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

#[async_trait]
impl Telemetry for TracingTelemetry {
    async fn emit(&self, event: &TelemetryEvent) -> Result<(), SessionError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|e| SessionError::transport(format!("unserializable payload: {e}")))?;
        let message = event.message.as_str();
        match event.level {
            EventLevel::Trace => tracing::trace!(%payload, "{message}"),
            EventLevel::Debug => tracing::debug!(%payload, "{message}"),
            EventLevel::Info => tracing::info!(%payload, "{message}"),
            EventLevel::Warn => tracing::warn!(%payload, "{message}"),
            EventLevel::Error => tracing::error!(%payload, "{message}"),
        }
        Ok(())
    }
}

/// Keeps events in memory, for tests and offline inspection
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
    failure: Option<SessionError>,
}

impl RecordingTelemetry {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder that stores events but reports `error` on every emit
    #[must_use]
    pub fn failing(error: SessionError) -> Self {
        Self {
            events: Mutex::default(),
            failure: Some(error),
        }
    }

    /// Events recorded so far
    #[must_use]
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages recorded so far
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

#[async_trait]
impl Telemetry for RecordingTelemetry {
    async fn emit(&self, event: &TelemetryEvent) -> Result<(), SessionError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        self.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl<T: Telemetry + ?Sized> Telemetry for std::sync::Arc<T> {
    async fn emit(&self, event: &TelemetryEvent) -> Result<(), SessionError> {
        (**self).emit(event).await
    }
}
