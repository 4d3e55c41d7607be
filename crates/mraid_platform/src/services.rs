//! Native services the ad can reach: calendar, video player, user prompts

use chrono::{DateTime, FixedOffset};

use crate::error::Result;

/// Calendar availability for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Availability {
    Free,
    Busy,
}

/// Validated calendar event, ready for the host calendar
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub begin: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub availability: Option<Availability>,
    /// Recurrence rule, empty for one-off events
    pub recurrence_rule: String,
}

/// Host calendar
pub trait CalendarHost {
    /// Hand an event to the calendar app
    ///
    /// Returns `PlatformError::Unavailable` when no calendar app is installed.
    fn insert_calendar_event(&mut self, event: &CalendarEvent) -> Result<()>;
}

/// Host video player
pub trait MediaPlayer {
    /// Start full-screen playback of a video URL
    fn play_video(&mut self, url: &str) -> Result<()>;
}

/// Outcome of asking the host to prompt the user
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    /// A dialog is showing; the host reports acceptance later
    Shown,
    /// The host context cannot show dialogs
    Unavailable,
}

/// Host dialogs and transient notices
pub trait UserPrompt {
    /// Ask the user whether to save a picture
    fn confirm_picture_download(&mut self, url: &str) -> PromptOutcome;

    /// Show a short transient notice
    fn show_notice(&mut self, message: &str);
}
