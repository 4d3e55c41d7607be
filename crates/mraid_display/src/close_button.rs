//! Native close button policy

use mraid_core::{AdEventSink, NativeCloseButtonStyle};
use mraid_platform::{Gravity, LayoutParams, ViewHierarchy, ViewId, ViewKind};
use tracing::debug;

/// Whether the native close button should be shown while expanded
pub fn resolve_visibility(style: NativeCloseButtonStyle, ad_wants_custom_close: bool) -> bool {
    match style {
        NativeCloseButtonStyle::AlwaysVisible => true,
        NativeCloseButtonStyle::AlwaysHidden => false,
        NativeCloseButtonStyle::AdControlled => !ad_wants_custom_close,
    }
}

/// Owns the native close button view
pub struct CloseButtonController {
    style: NativeCloseButtonStyle,
    size_px: u32,
    ad_wants_custom_close: bool,
    button: Option<ViewId>,
    attached: bool,
}

impl CloseButtonController {
    pub fn new(style: NativeCloseButtonStyle, size_px: u32) -> Self {
        Self {
            style,
            size_px,
            ad_wants_custom_close: false,
            button: None,
            attached: false,
        }
    }

    /// Button edge in physical pixels
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    pub fn ad_wants_custom_close(&self) -> bool {
        self.ad_wants_custom_close
    }

    pub fn should_show(&self) -> bool {
        resolve_visibility(self.style, self.ad_wants_custom_close)
    }

    /// Whether the button is currently in the ad container
    pub fn is_shown(&self) -> bool {
        self.attached
    }

    pub fn button(&self) -> Option<ViewId> {
        self.button
    }

    /// Record the ad's custom close intent
    ///
    /// The host is told the native button should show exactly when the ad
    /// does not provide its own, whatever the current state.
    pub fn use_custom_close(&mut self, custom: bool, sink: &mut dyn AdEventSink) {
        self.ad_wants_custom_close = custom;
        sink.on_close_button_state_change(!custom);
    }

    /// Add or remove the button at the top right of `container`
    pub fn set_enabled<H: ViewHierarchy + ?Sized>(
        &mut self,
        host: &mut H,
        container: ViewId,
        enabled: bool,
        sink: &mut dyn AdEventSink,
    ) {
        if enabled {
            let button = *self
                .button
                .get_or_insert_with(|| host.create_view(ViewKind::CloseButton));
            if !self.attached {
                let params = LayoutParams::exact(self.size_px, self.size_px).gravity(Gravity::TopRight);
                match host.insert_child(container, button, None, params) {
                    Ok(()) => self.attached = true,
                    Err(err) => debug!(error = %err, "Failed to add close button"),
                }
            }
        } else if let Some(button) = self.button.filter(|_| self.attached) {
            if let Err(err) = host.remove_child(container, button) {
                debug!(error = %err, "Failed to remove close button");
            }
            self.attached = false;
        }

        sink.on_close_button_state_change(enabled);
    }

    /// Detach and release the button view, without notifying anyone
    pub fn release<H: ViewHierarchy + ?Sized>(&mut self, host: &mut H) {
        if let Some(button) = self.button.take() {
            host.release_view(button);
        }
        self.attached = false;
    }
}
