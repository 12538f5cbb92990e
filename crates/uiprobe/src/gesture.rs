//! Touch gestures expressed as W3C pointer action sequences.

use crate::geometry::{Point, Size};
use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};

/// One step of a pointer action sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PointerAction {
    /// Move the pointer to an absolute viewport position
    #[serde(rename = "pointerMove")]
    Move {
        /// Target X
        x: u32,
        /// Target Y
        y: u32,
        /// Movement duration
        #[serde(rename = "duration")]
        duration_ms: u64,
    },
    /// Press
    #[serde(rename = "pointerDown")]
    Down,
    /// Hold still
    #[serde(rename = "pause")]
    Pause {
        /// Pause duration
        #[serde(rename = "duration")]
        duration_ms: u64,
    },
    /// Release
    #[serde(rename = "pointerUp")]
    Up,
}

/// Kind of pointer driving a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerType {
    /// Finger
    Touch,
}

/// Pointer parameters of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerParameters {
    /// Pointer type
    pub pointer_type: PointerType,
}

/// A named input source with its ordered actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSequence {
    /// Input source type, always `"pointer"` here
    #[serde(rename = "type")]
    pub source_type: String,
    /// Input source id
    pub id: String,
    /// Pointer parameters
    pub parameters: PointerParameters,
    /// Actions, performed in order
    pub actions: Vec<PointerAction>,
}

impl ActionSequence {
    /// Touch sequence for the first finger
    #[must_use]
    pub fn finger(actions: Vec<PointerAction>) -> Self {
        Self {
            source_type: "pointer".to_string(),
            id: "finger1".to_string(),
            parameters: PointerParameters {
                pointer_type: PointerType::Touch,
            },
            actions,
        }
    }
}

/// Durations used when building gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTimings {
    /// Duration of each pointer move
    pub move_duration_ms: u64,
    /// Hold time between press and release of a tap
    pub tap_pause_ms: u64,
    /// Hold time before a swipe starts moving
    pub swipe_hold_ms: u64,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            move_duration_ms: 50,
            tap_pause_ms: 50,
            swipe_hold_ms: 600,
        }
    }
}

/// Tap at `point`: move, press, short pause, release
#[must_use]
pub fn tap_sequence(point: Point, timings: &GestureTimings) -> ActionSequence {
    ActionSequence::finger(vec![
        PointerAction::Move {
            x: point.x,
            y: point.y,
            duration_ms: timings.move_duration_ms,
        },
        PointerAction::Down,
        PointerAction::Pause {
            duration_ms: timings.tap_pause_ms,
        },
        PointerAction::Up,
    ])
}

/// Swipe from `from` to `to`: press, hold, move, release
#[must_use]
pub fn swipe_sequence(from: Point, to: Point, timings: &GestureTimings) -> ActionSequence {
    ActionSequence::finger(vec![
        PointerAction::Move {
            x: from.x,
            y: from.y,
            duration_ms: timings.move_duration_ms,
        },
        PointerAction::Down,
        PointerAction::Pause {
            duration_ms: timings.swipe_hold_ms,
        },
        PointerAction::Move {
            x: to.x,
            y: to.y,
            duration_ms: timings.move_duration_ms,
        },
        PointerAction::Up,
    ])
}

/// Axis of a full-screen swipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    /// Along the Y axis
    Vertical,
    /// Along the X axis
    #[default]
    Horizontal,
}

/// Start and end points of a full-screen swipe.
///
/// Percentages are relative to the screen extent along the swipe axis; the
/// other coordinate sits on the screen's centre line.
///
/// # Errors
///
/// Returns [`ProbeError::InvalidArgument`] if a percentage exceeds 100.
pub fn swipe_points(
    direction: SwipeDirection,
    screen: Size,
    from_percent: u32,
    to_percent: u32,
) -> ProbeResult<(Point, Point)> {
    for percent in [from_percent, to_percent] {
        if percent > 100 {
            return Err(ProbeError::invalid_argument(format!(
                "swipe percentage must be within 0..=100, got {percent}"
            )));
        }
    }

    let points = match direction {
        SwipeDirection::Vertical => {
            let x = percent_of(screen.width, 50);
            (
                Point::new(x, percent_of(screen.height, from_percent)),
                Point::new(x, percent_of(screen.height, to_percent)),
            )
        }
        SwipeDirection::Horizontal => {
            let y = percent_of(screen.height, 50);
            (
                Point::new(percent_of(screen.width, from_percent), y),
                Point::new(percent_of(screen.width, to_percent), y),
            )
        }
    };
    Ok(points)
}

/// `extent * percent / 100`, rounded to the nearest pixel
fn percent_of(extent: u32, percent: u32) -> u32 {
    let scaled = (u64::from(extent) * u64::from(percent) + 50) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
