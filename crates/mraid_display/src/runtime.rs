//! Single-threaded control loop
//!
//! Every controller input arrives as a [`ControlMessage`] on one channel and
//! is handled in order, interleaved with viewability ticks. Hosts and other
//! threads talk to the loop through a [`ControllerHandle`].

use std::collections::HashMap;
use std::path::PathBuf;

use mraid_core::{AdEventSink, MraidCommand};
use mraid_platform::{ConfigurationListener, ViewId};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::config::ControllerConfig;
use crate::controller::AdDisplayController;
use crate::error::DownloadError;
use crate::host::SharedHost;
use crate::picture::PictureDownloader;
use crate::viewability::ViewabilityCheck;

/// Control flow after handling a message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    /// Keep processing messages
    #[default]
    Continue,
    /// Stop the loop
    Exit,
}

/// Inputs to a controller
#[derive(Debug)]
pub enum ControlMessage {
    /// Typed payload command
    Command(MraidCommand),
    /// Payload command as received from the bridge
    RawCommand {
        name: String,
        params: HashMap<String, String>,
    },
    /// The payload finished loading
    ContentReady,
    /// Host configuration changed (rotation, resize)
    ConfigurationChanged,
    /// The user confirmed saving a picture
    SavePictureAccepted(String),
    /// A picture download finished
    PictureStored(Result<PathBuf, DownloadError>),
    /// The native close button was tapped
    NativeCloseTapped,
    /// Two-part expansion content of the given generation closed itself
    SecondaryClosed { generation: u64 },
    /// Message for the two-part expansion controller
    ///
    /// A message stamped with a generation is dropped unless that
    /// generation is still the live content; `None` addresses whichever
    /// content is live.
    Secondary {
        generation: Option<u64>,
        message: Box<ControlMessage>,
    },
    /// Tear the controller down
    Destroy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Main,
    Secondary(Option<u64>),
}

/// Sending half of a control loop channel
///
/// A nested sender addresses the two-part expansion controller of the
/// loop's main controller.
#[derive(Clone, Debug)]
pub struct ControlSender {
    tx: UnboundedSender<ControlMessage>,
    route: Route,
}

impl ControlSender {
    pub(crate) fn new(tx: UnboundedSender<ControlMessage>) -> Self {
        Self {
            tx,
            route: Route::Main,
        }
    }

    /// Sender addressing whichever secondary controller is live
    pub fn nested(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            route: Route::Secondary(None),
        }
    }

    /// Sender owned by one secondary controller
    ///
    /// Its messages are dropped once that controller is gone.
    pub(crate) fn for_generation(&self, generation: u64) -> Self {
        Self {
            tx: self.tx.clone(),
            route: Route::Secondary(Some(generation)),
        }
    }

    /// Queue a message; false once the loop is gone
    pub fn post(&self, message: ControlMessage) -> bool {
        let message = match self.route {
            Route::Main => message,
            Route::Secondary(generation) => ControlMessage::Secondary {
                generation,
                message: Box::new(message),
            },
        };
        self.tx.send(message).is_ok()
    }

    /// Listener that turns host configuration changes into messages
    pub fn configuration_listener(&self) -> ConfigurationListener {
        let sender = self.clone();
        Box::new(move || {
            sender.post(ControlMessage::ConfigurationChanged);
        })
    }
}

/// Cloneable handle for driving a controller from the host
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    sender: ControlSender,
}

impl ControllerHandle {
    /// Handle addressing the two-part expansion controller
    pub fn secondary(&self) -> Self {
        Self {
            sender: self.sender.nested(),
        }
    }

    pub fn post(&self, message: ControlMessage) -> bool {
        self.sender.post(message)
    }

    pub fn command(&self, command: MraidCommand) -> bool {
        self.post(ControlMessage::Command(command))
    }

    pub fn raw_command(&self, name: impl Into<String>, params: HashMap<String, String>) -> bool {
        self.post(ControlMessage::RawCommand {
            name: name.into(),
            params,
        })
    }

    pub fn content_ready(&self) -> bool {
        self.post(ControlMessage::ContentReady)
    }

    pub fn configuration_changed(&self) -> bool {
        self.post(ControlMessage::ConfigurationChanged)
    }

    pub fn accept_picture(&self, uri: impl Into<String>) -> bool {
        self.post(ControlMessage::SavePictureAccepted(uri.into()))
    }

    pub fn native_close_tapped(&self) -> bool {
        self.post(ControlMessage::NativeCloseTapped)
    }

    pub fn destroy(&self) -> bool {
        self.post(ControlMessage::Destroy)
    }
}

/// Owns a controller and feeds it messages and ticks
pub struct ControlLoop {
    controller: AdDisplayController,
    rx: UnboundedReceiver<ControlMessage>,
}

impl ControlLoop {
    /// Create the controller for `surface` and its loop
    ///
    /// The controller starts in the loading state.
    pub fn new(
        config: ControllerConfig,
        host: SharedHost,
        surface: ViewId,
        sink: Box<dyn AdEventSink>,
        pictures: PictureDownloader,
    ) -> (Self, ControllerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sender = ControlSender::new(tx);
        let handle = ControllerHandle {
            sender: sender.clone(),
        };
        let controller = AdDisplayController::new(config, host, surface, sink, sender, pictures);
        (Self { controller, rx }, handle)
    }

    /// Replace the viewability check
    pub fn with_viewability_check(mut self, check: Box<dyn ViewabilityCheck>) -> Self {
        self.controller.set_viewability_check(check);
        self
    }

    pub fn controller(&self) -> &AdDisplayController {
        &self.controller
    }

    /// Run until the controller is destroyed
    ///
    /// The first viewability tick happens before any queued message. The
    /// future is not `Send`; run it on a current-thread runtime or a
    /// `LocalSet`.
    pub async fn run(mut self) -> AdDisplayController {
        let mut ticker = tokio::time::interval(self.controller.config().viewability_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = ticker.tick() => {
                    trace!("viewability tick");
                    self.controller.tick();
                }
                message = self.rx.recv() => {
                    let Some(message) = message else {
                        self.controller.destroy();
                        break;
                    };
                    if self.controller.handle_message(message) == ControlFlow::Exit {
                        break;
                    }
                }
            }
        }

        debug!("Control loop stopped");
        self.controller
    }
}
