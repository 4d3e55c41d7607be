//! The host seen by the display controller

use std::cell::RefCell;
use std::rc::Rc;

use mraid_core::AdEventSink;
use mraid_platform::{
    CalendarHost, DeviceInfo, MediaPlayer, OrientationHost, PlatformError, UserPrompt,
    ViewHierarchy, ViewId,
};

/// A fresh ad surface for two-part expansion content, with its own bridge
pub struct SecondarySurface {
    pub view: ViewId,
    pub sink: Box<dyn AdEventSink>,
}

/// Everything the controller needs from the embedding application
pub trait Host:
    ViewHierarchy + OrientationHost + DeviceInfo + CalendarHost + MediaPlayer + UserPrompt
{
    /// Create a detached ad surface for secondary content
    fn create_secondary_surface(&mut self) -> Result<SecondarySurface, PlatformError>;
}

/// Host shared by every controller on the control loop
pub type SharedHost = Rc<RefCell<dyn Host>>;
