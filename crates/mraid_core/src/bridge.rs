//! Outbound side of the scripting bridge
//!
//! [`AdEventSink`] is everything the controller says to the outside world:
//! property changes and errors go to the payload, the remaining callbacks go
//! to the host application's listener.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::command::CommandName;
use crate::property::{properties_to_json, MraidProperty};
use crate::state::ViewState;

/// Receiver of controller output
pub trait AdEventSink {
    /// Push changed properties to the payload
    fn fire_change_event(&mut self, properties: &[MraidProperty]);

    /// Report a failed command to the payload
    fn fire_error_event(&mut self, command: CommandName, message: &str);

    /// The ad finished expanding
    fn on_expand(&mut self) {}

    /// The ad was closed; `state` is the state after closing
    fn on_close(&mut self, _state: ViewState) {}

    /// The native close button should be shown (`true`) or hidden
    fn on_close_button_state_change(&mut self, _visible: bool) {}
}

/// Recorded controller output
#[derive(Clone, Debug, PartialEq)]
pub enum AdEvent {
    Change(Vec<MraidProperty>),
    Error { command: CommandName, message: String },
    Expand,
    Close(ViewState),
    CloseButtonStateChange(bool),
}

impl AdEvent {
    /// JSON form used by the CLI and logs
    pub fn to_json(&self) -> Value {
        match self {
            AdEvent::Change(properties) => {
                serde_json::json!({ "event": "change", "properties": properties_to_json(properties) })
            }
            AdEvent::Error { command, message } => serde_json::json!({
                "event": "error",
                "action": command.as_str(),
                "message": message,
            }),
            AdEvent::Expand => serde_json::json!({ "event": "expand" }),
            AdEvent::Close(state) => {
                serde_json::json!({ "event": "close", "state": state.as_str() })
            }
            AdEvent::CloseButtonStateChange(visible) => {
                serde_json::json!({ "event": "closeButtonStateChange", "visible": visible })
            }
        }
    }
}

/// Sink that appends every event to a shared log
///
/// Clones share the same log, so a test can keep one half and hand the
/// other to the controller.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Rc<RefCell<Vec<AdEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<AdEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far
    pub fn take(&self) -> Vec<AdEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// All error events
    pub fn errors(&self) -> Vec<(CommandName, String)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                AdEvent::Error { command, message } => Some((*command, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Every property from every change event, in order
    pub fn properties(&self) -> Vec<MraidProperty> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                AdEvent::Change(properties) => Some(properties.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn push(&self, event: AdEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl AdEventSink for RecordingSink {
    fn fire_change_event(&mut self, properties: &[MraidProperty]) {
        self.push(AdEvent::Change(properties.to_vec()));
    }

    fn fire_error_event(&mut self, command: CommandName, message: &str) {
        self.push(AdEvent::Error {
            command,
            message: message.to_string(),
        });
    }

    fn on_expand(&mut self) {
        self.push(AdEvent::Expand);
    }

    fn on_close(&mut self, state: ViewState) {
        self.push(AdEvent::Close(state));
    }

    fn on_close_button_state_change(&mut self, visible: bool) {
        self.push(AdEvent::CloseButtonStateChange(visible));
    }
}
