//! Orientation lock and rotation tracking

use mraid_platform::{
    ConfigurationListener, ListenerToken, OrientationHost, PlatformError, RequestedOrientation,
    Rotation,
};
use tracing::{debug, warn};

use crate::host::SharedHost;

/// Locks the host to its current orientation while expanded
///
/// The orientation requested when the controller was created is captured
/// once and restored on unlock.
#[derive(Debug)]
pub struct OrientationLockManager {
    original: RequestedOrientation,
    locked: bool,
    last_rotation: Rotation,
}

impl OrientationLockManager {
    /// Snapshot the host's requested orientation and current rotation
    pub fn capture<H: OrientationHost + ?Sized>(host: &H) -> Self {
        let original = host.requested_orientation().unwrap_or_else(|err| {
            debug!("No requested orientation available ({err}), assuming unspecified");
            RequestedOrientation::Unspecified
        });

        Self {
            original,
            locked: false,
            last_rotation: host.display_rotation(),
        }
    }

    pub fn original(&self) -> RequestedOrientation {
        self.original
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Lock to the current physical orientation, or restore the original
    ///
    /// Hosts that cannot change orientation are left alone.
    pub fn set_lock_enabled<H: OrientationHost + ?Sized>(&mut self, host: &mut H, enabled: bool) {
        let requested = if enabled {
            RequestedOrientation::locked_to(host.device_orientation())
        } else {
            self.original
        };

        match host.set_requested_orientation(requested) {
            Ok(()) => self.locked = enabled,
            Err(err) => debug!(error = %err, "Unable to modify device orientation."),
        }
    }

    /// Record a rotation; true when it differs from the last one seen
    pub fn rotation_changed(&mut self, rotation: Rotation) -> bool {
        if rotation == self.last_rotation {
            return false;
        }
        self.last_rotation = rotation;
        true
    }
}

/// Registration for configuration-change notifications
///
/// Unregisters on [`release`](Self::release) or drop, whichever comes first.
pub struct RotationSubscription {
    host: SharedHost,
    token: Option<ListenerToken>,
}

impl RotationSubscription {
    /// Register `listener` with the host
    ///
    /// A failed registration yields an inert subscription.
    pub fn register(host: &SharedHost, listener: ConfigurationListener) -> Self {
        let token = match host.borrow_mut().register_configuration_listener(listener) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(error = %err, "Failed to register for configuration changes");
                None
            }
        };

        Self {
            host: host.clone(),
            token,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.token.is_some()
    }

    /// Unregister; later calls do nothing
    pub fn release(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };

        let Ok(mut host) = self.host.try_borrow_mut() else {
            warn!(token = token.0, "Host busy, configuration listener left registered");
            return;
        };

        match host.unregister_configuration_listener(token) {
            Ok(()) => {}
            Err(PlatformError::NotRegistered(_)) => {
                debug!(token = token.0, "Configuration listener already unregistered");
            }
            Err(err) => warn!(error = %err, "Failed to unregister configuration listener"),
        }
    }
}

impl Drop for RotationSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
