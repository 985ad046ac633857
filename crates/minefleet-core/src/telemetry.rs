//! Telemetry adapter: turns broker messages into external proposals.
//!
//! Parsing happens in `minefleet_logic::telemetry`; anything malformed is
//! logged and returned as an error without touching the fleet. Positions
//! outside the map are clamped before submission.

use std::sync::Arc;

use minefleet_logic::telemetry::{reading_effect, ReadingEffect, TelemetryError, TelemetryMessage, TopicScheme};

use crate::dispatcher::{Dispatcher, Resolution};
use crate::update::{PositionChange, ProposedUpdate, Reading};

#[derive(Clone)]
pub struct TelemetryAdapter {
    dispatcher: Arc<Dispatcher>,
    topics: TopicScheme,
}

impl TelemetryAdapter {
    pub fn new(dispatcher: Arc<Dispatcher>, topics: TopicScheme) -> Self {
        Self { dispatcher, topics }
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Handle one raw broker message.
    pub fn handle_message(&self, topic: &str, payload: &str) -> Result<Resolution, TelemetryError> {
        let message = self.topics.parse(topic, payload).inspect_err(|err| {
            log::warn!("Ignoring telemetry on {}: {}", topic, err);
        })?;
        self.handle(message)
    }

    /// Handle an already-parsed message.
    pub fn handle(&self, message: TelemetryMessage) -> Result<Resolution, TelemetryError> {
        let bounds = self.dispatcher.map().bounds();
        match message {
            TelemetryMessage::Position { truck, position } => {
                let clamped = bounds.clamp(position);
                if clamped != position {
                    log::debug!(
                        "Clamped telemetry position ({}, {}) for truck {}",
                        position.x,
                        position.y,
                        truck
                    );
                }
                Ok(self.dispatcher.submit(ProposedUpdate::external(truck, clamped)))
            }
            TelemetryMessage::Reading {
                truck,
                channel,
                field,
                value,
            } => {
                let effect = reading_effect(channel, &field, &value).inspect_err(|err| {
                    log::warn!("Ignoring reading for truck {}: {}", truck, err);
                })?;
                let mut angle = None;
                let change = match effect {
                    ReadingEffect::SetX(x) => PositionChange::SetX(x.clamp(0.0, bounds.max_x)),
                    ReadingEffect::SetY(y) => PositionChange::SetY(y.clamp(0.0, bounds.max_y)),
                    ReadingEffect::Heading(a) => {
                        angle = Some(a);
                        PositionChange::Keep
                    }
                    ReadingEffect::RecordOnly => PositionChange::Keep,
                };
                let proposal = ProposedUpdate::external(truck, change)
                    .with_angle(angle)
                    .with_reading(Reading {
                        channel,
                        field,
                        value,
                    });
                Ok(self.dispatcher.submit(proposal))
            }
        }
    }
}
