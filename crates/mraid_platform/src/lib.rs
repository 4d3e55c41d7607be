//! MRAID Platform Abstraction Layer
//!
//! This crate provides the host-side contracts the MRAID display controller
//! relies on. The controller never touches native widgets directly; every
//! side effect goes through one of these traits.
//!
//! # Architecture
//!
//! - [`ViewHierarchy`] - The host display list (attach, detach, reorder views)
//! - [`OrientationHost`] - Orientation preference and rotation notifications
//! - [`DeviceInfo`] - Display metrics and static capability flags
//! - [`CalendarHost`], [`MediaPlayer`], [`UserPrompt`] - Native services
//! - [`MediaIndex`] - Asynchronous media index registration
//!
//! # Host Implementations
//!
//! - `mraid_display::headless` - In-memory host for tests and the CLI
//! - Android and iOS hosts implement these traits over their native view systems

mod device;
mod error;
mod media;
mod orientation;
mod services;
mod view;

// Re-export all public types
pub use device::{DeviceFeatures, DeviceInfo, DisplayMetrics};
pub use error::{PlatformError, Result};
pub use media::{MediaIndex, MediaIndexConnection, NullMediaIndex};
pub use orientation::{
    ConfigurationListener, DeviceOrientation, ListenerToken, OrientationHost,
    RequestedOrientation, Rotation,
};
pub use services::{
    Availability, CalendarEvent, CalendarHost, MediaPlayer, PromptOutcome, UserPrompt,
};
pub use view::{Dimension, Gravity, LayoutParams, Size, ViewHierarchy, ViewId, ViewKind};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::device::{DeviceFeatures, DeviceInfo, DisplayMetrics};
    pub use crate::error::{PlatformError, Result};
    pub use crate::media::{MediaIndex, MediaIndexConnection};
    pub use crate::orientation::{
        DeviceOrientation, OrientationHost, RequestedOrientation, Rotation,
    };
    pub use crate::services::{CalendarHost, MediaPlayer, PromptOutcome, UserPrompt};
    pub use crate::view::{LayoutParams, Size, ViewHierarchy, ViewId, ViewKind};
}
