//! Outbound sink: the only seam between the engine and a transport.
//!
//! Sends are fire-and-forget. A sink that cannot deliver logs and drops.

use crossbeam_channel::{Receiver, Sender};

/// Where operator commands and setpoints go.
pub trait Outbound: Send + Sync {
    /// One command line for the mine-simulation socket.
    fn send_command(&self, line: String);

    /// One message for the telemetry broker.
    fn publish(&self, topic: String, payload: String);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Command(String),
    Publish { topic: String, payload: String },
}

/// Forwards everything over a crossbeam channel to whatever owns the transport.
#[derive(Clone)]
pub struct ChannelOutbound {
    tx: Sender<OutboundMessage>,
}

impl ChannelOutbound {
    pub fn new() -> (Self, Receiver<OutboundMessage>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    fn forward(&self, message: OutboundMessage) {
        if let Err(err) = self.tx.send(message) {
            log::debug!("Outbound receiver gone, dropping {:?}", err.into_inner());
        }
    }
}

impl Outbound for ChannelOutbound {
    fn send_command(&self, line: String) {
        self.forward(OutboundMessage::Command(line));
    }

    fn publish(&self, topic: String, payload: String) {
        self.forward(OutboundMessage::Publish { topic, payload });
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutbound;

impl Outbound for NullOutbound {
    fn send_command(&self, _line: String) {}

    fn publish(&self, _topic: String, _payload: String) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_outbound_forwards_in_order() {
        let (out, rx) = ChannelOutbound::new();
        out.send_command("add_truck".into());
        out.publish("planner/truck/1/setpoint".into(), "10,20".into());
        assert_eq!(rx.try_recv(), Ok(OutboundMessage::Command("add_truck".into())));
        assert_eq!(
            rx.try_recv(),
            Ok(OutboundMessage::Publish {
                topic: "planner/truck/1/setpoint".into(),
                payload: "10,20".into(),
            })
        );
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (out, rx) = ChannelOutbound::new();
        drop(rx);
        out.send_command("set_auto:1".into());
    }
}
