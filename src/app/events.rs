//! Outbound application events.
//!
//! Both services emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them.

use crate::error::Error;

use super::commands::CommandError;
use super::status::{ControllerStatus, PlantHealth};

/// Which firmware image is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Controller,
    Camera,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A service has started.
    Started(Node),

    /// Broker session came up or dropped.
    ConnectionChanged { connected: bool },

    /// Status document sent to the broker.
    StatusPublished(ControllerStatus),

    /// Publish interval elapsed while offline; the document was dropped.
    StatusSkipped,

    /// Relay state after applying a command.
    RelaysChanged { pump: bool, light: bool },

    /// An inbound command could not be used.
    CommandRejected(CommandError),

    /// A capture was classified.
    CaptureClassified { health: PlantHealth, bytes: usize, captures: u32 },

    /// A capture cycle failed at some stage.
    CaptureFailed(Error),

    /// A relay could not be driven.
    ActuatorFault(Error),
}
