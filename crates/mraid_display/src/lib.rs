//! MRAID ad display controller
//!
//! Drives one rich-media ad through its display states:
//!
//! ```text
//! LOADING --content ready--> DEFAULT --expand--> EXPANDED
//!                               |  ^                 |
//!                             close +-----close------+
//!                               v
//!                            HIDDEN
//! ```
//!
//! # Architecture
//!
//! - [`AdDisplayController`] - owns the view state and dispatches commands
//! - [`ExpansionCoordinator`] - placeholder swap and overlay construction
//! - [`ViewabilityMonitor`] - edge-triggered on-screen polling
//! - [`OrientationLockManager`] / [`RotationSubscription`] - orientation lock
//!   and rotation tracking
//! - [`CloseButtonController`] - native close button policy
//! - [`PictureDownloader`] - `storePicture` download pipeline
//! - [`ControlLoop`] - the single-threaded loop every input goes through
//!
//! # Example
//!
//! ```ignore
//! let (control, handle) = ControlLoop::new(config, host, surface, sink, pictures);
//! handle.content_ready();
//! handle.command(MraidCommand::Close);
//! handle.destroy();
//! control.run().await;
//! ```

pub mod close_button;
pub mod config;
pub mod controller;
pub mod error;
pub mod expansion;
pub mod headless;
pub mod host;
pub mod metrics;
pub mod orientation;
pub mod picture;
pub mod runtime;
pub mod viewability;

pub use close_button::{resolve_visibility, CloseButtonController};
pub use config::ControllerConfig;
pub use controller::AdDisplayController;
pub use error::{ConfigError, DownloadError};
pub use expansion::{ExpansionCoordinator, ExpansionSnapshot};
pub use headless::HeadlessHost;
pub use host::{Host, SecondarySurface, SharedHost};
pub use metrics::ScreenMetrics;
pub use orientation::{OrientationLockManager, RotationSubscription};
pub use picture::{
    picture_file_name, FetchedResponse, PictureDownloader, PictureFetcher, ReqwestFetcher,
    ResponseBody,
};
pub use runtime::{ControlFlow, ControlLoop, ControlMessage, ControlSender, ControllerHandle};
pub use viewability::{ViewabilityCheck, ViewabilityMonitor};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ControllerConfig;
    pub use crate::controller::AdDisplayController;
    pub use crate::headless::HeadlessHost;
    pub use crate::host::{Host, SharedHost};
    pub use crate::picture::{PictureDownloader, PictureFetcher};
    pub use crate::runtime::{ControlLoop, ControllerHandle};
    pub use mraid_core::{AdEventSink, MraidCommand, ViewState};
}
