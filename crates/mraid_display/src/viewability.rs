//! Periodic on-screen check
//!
//! The control loop calls [`ViewabilityMonitor::poll`] on every tick. Only
//! changes are reported, so the payload sees one event per transition.

use tracing::trace;

/// Decides whether the ad is currently on screen
pub trait ViewabilityCheck {
    fn is_viewable(&mut self) -> bool;
}

impl<F> ViewabilityCheck for F
where
    F: FnMut() -> bool,
{
    fn is_viewable(&mut self) -> bool {
        self()
    }
}

/// Edge-triggered viewability tracker
pub struct ViewabilityMonitor {
    check: Box<dyn ViewabilityCheck>,
    viewable: bool,
    running: bool,
}

impl Default for ViewabilityMonitor {
    fn default() -> Self {
        Self::new(Box::new(|| true))
    }
}

impl ViewabilityMonitor {
    /// The monitor starts stopped and not viewable
    pub fn new(check: Box<dyn ViewabilityCheck>) -> Self {
        Self {
            check,
            viewable: false,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Last observed viewability
    pub fn is_viewable(&self) -> bool {
        self.viewable
    }

    /// Run the check; returns the new value if it changed
    pub fn poll(&mut self) -> Option<bool> {
        if !self.running {
            return None;
        }

        let viewable = self.check.is_viewable();
        if viewable == self.viewable {
            return None;
        }

        trace!(viewable, "viewability changed");
        self.viewable = viewable;
        Some(viewable)
    }
}
