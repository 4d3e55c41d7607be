//! MRAID protocol core
//!
//! The vocabulary shared by the display controller and the scripting bridge:
//!
//! - [`ViewState`] and the per-controller policies ([`ExpansionStyle`],
//!   [`NativeCloseButtonStyle`], [`PlacementType`])
//! - [`MraidCommand`] - typed payload commands
//! - [`MraidProperty`] - properties pushed back to the payload as JSON
//! - [`AdEventSink`] - the outbound half of the bridge
//! - [`calendar`] - calendar request validation and RRULE generation

pub mod bridge;
pub mod calendar;
pub mod command;
pub mod error;
pub mod property;
pub mod state;

pub use bridge::{AdEvent, AdEventSink, RecordingSink};
pub use calendar::{
    build_recurrence_rule, translate_calendar_request, CalendarError, Frequency,
    RecurrenceRequest,
};
pub use command::{CommandName, ExpandRequest, MraidCommand};
pub use error::{MraidError, Result};
pub use property::{properties_to_json, MraidProperty, Supports};
pub use state::{ExpansionStyle, NativeCloseButtonStyle, PlacementType, ViewState};
