//! Inbound telemetry topics and payloads, outbound setpoints.
//!
//! Topic shapes (roots are configurable):
//!
//! ```text
//! {root}/{id}/sensor/{field}        scalar, string-encoded
//! {root}/{id}/failure/{field}       scalar, string-encoded
//! {root}/{id}/position              "<x>,<y>"
//! {planner_root}/{id}/position      "<x>,<y>"
//! {planner_root}/{id}/setpoint      "<x>,<y>" (published)
//! ```
//!
//! Malformed messages are rejected here, at the boundary, and never reach
//! the dispatcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{fields, is_valid_angle, topics};
use crate::geometry::LogicalPoint;
use crate::TruckId;

/// Telemetry parse errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TelemetryError {
    #[error("unrecognised telemetry topic: {0}")]
    UnknownTopic(String),

    #[error("invalid truck id in topic: {0}")]
    BadTruckId(String),

    #[error("malformed position payload: {0:?}")]
    MalformedPosition(String),

    #[error("malformed value for {field}: {value:?}")]
    MalformedValue { field: String, value: String },

    #[error("angle {0} outside [-180, 180]")]
    AngleOutOfRange(i32),
}

/// Which scalar channel a reading arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingChannel {
    Sensor,
    Failure,
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    Position {
        truck: TruckId,
        position: LogicalPoint,
    },
    Reading {
        truck: TruckId,
        channel: ReadingChannel,
        field: String,
        value: String,
    },
}

impl TelemetryMessage {
    pub fn truck(&self) -> TruckId {
        match self {
            TelemetryMessage::Position { truck, .. } | TelemetryMessage::Reading { truck, .. } => {
                *truck
            }
        }
    }
}

/// What a scalar reading does to the truck besides being recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadingEffect {
    SetX(f64),
    SetY(f64),
    Heading(i32),
    RecordOnly,
}

/// Topic roots for inbound and outbound telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicScheme {
    pub root: String,
    pub planner_root: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            root: topics::ROOT.to_string(),
            planner_root: topics::PLANNER_ROOT.to_string(),
        }
    }
}

impl TopicScheme {
    /// Parse a topic/payload pair into a telemetry message.
    pub fn parse(&self, topic: &str, payload: &str) -> Result<TelemetryMessage, TelemetryError> {
        let rest = self
            .strip_root(topic)
            .ok_or_else(|| TelemetryError::UnknownTopic(topic.to_string()))?;
        let parts: Vec<&str> = rest.split('/').collect();

        let truck = |s: &str| -> Result<TruckId, TelemetryError> {
            s.parse()
                .map_err(|_| TelemetryError::BadTruckId(s.to_string()))
        };

        match parts.as_slice() {
            [id, "position"] => Ok(TelemetryMessage::Position {
                truck: truck(*id)?,
                position: parse_position_payload(payload)?,
            }),
            [id, channel @ ("sensor" | "failure"), field] if !field.is_empty() => {
                let channel = if *channel == "sensor" {
                    ReadingChannel::Sensor
                } else {
                    ReadingChannel::Failure
                };
                Ok(TelemetryMessage::Reading {
                    truck: truck(*id)?,
                    channel,
                    field: field.to_string(),
                    value: payload.to_string(),
                })
            }
            _ => Err(TelemetryError::UnknownTopic(topic.to_string())),
        }
    }

    pub fn position_topic(&self, truck: TruckId) -> String {
        format!("{}/{}/position", self.planner_root, truck)
    }

    pub fn sensor_topic(&self, truck: TruckId, field: &str) -> String {
        format!("{}/{}/sensor/{}", self.root, truck, field)
    }

    pub fn failure_topic(&self, truck: TruckId, field: &str) -> String {
        format!("{}/{}/failure/{}", self.root, truck, field)
    }

    pub fn setpoint_topic(&self, truck: TruckId) -> String {
        format!("{}/{}/setpoint", self.planner_root, truck)
    }

    fn strip_root<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let mut roots = [self.planner_root.as_str(), self.root.as_str()];
        // longest first so a root that prefixes the other cannot shadow it
        roots.sort_by_key(|r| std::cmp::Reverse(r.len()));
        roots
            .iter()
            .find_map(|root| topic.strip_prefix(root)?.strip_prefix('/'))
    }
}

/// Parse `"<x>,<y>"`. No whitespace is tolerated.
pub fn parse_position_payload(payload: &str) -> Result<LogicalPoint, TelemetryError> {
    let malformed = || TelemetryError::MalformedPosition(payload.to_string());
    let (x, y) = payload.split_once(',').ok_or_else(malformed)?;
    let x: f64 = x.parse().map_err(|_| malformed())?;
    let y: f64 = y.parse().map_err(|_| malformed())?;
    let point = LogicalPoint::new(x, y);
    if !point.is_finite() {
        return Err(malformed());
    }
    Ok(point)
}

pub fn format_position_payload(p: LogicalPoint) -> String {
    format!("{},{}", p.x, p.y)
}

/// Interpret a sensor reading that carries pose information.
///
/// Failure-channel readings and unknown sensor keys are only recorded.
pub fn reading_effect(
    channel: ReadingChannel,
    field: &str,
    value: &str,
) -> Result<ReadingEffect, TelemetryError> {
    if channel != ReadingChannel::Sensor {
        return Ok(ReadingEffect::RecordOnly);
    }
    let number = || -> Result<f64, TelemetryError> {
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(TelemetryError::MalformedValue {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    };
    match field {
        fields::POSITION_X => Ok(ReadingEffect::SetX(number()?)),
        fields::POSITION_Y => Ok(ReadingEffect::SetY(number()?)),
        fields::ANGLE => {
            let raw = number()?.round();
            if raw < f64::from(i32::MIN) || raw > f64::from(i32::MAX) {
                return Err(TelemetryError::MalformedValue {
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
            let angle = raw as i32;
            if !is_valid_angle(angle) {
                return Err(TelemetryError::AngleOutOfRange(angle));
            }
            Ok(ReadingEffect::Heading(angle))
        }
        _ => Ok(ReadingEffect::RecordOnly),
    }
}
