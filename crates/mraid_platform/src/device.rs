//! Display metrics and static device capabilities

/// Raw display metrics reported by the host
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayMetrics {
    /// Display width in physical pixels
    pub width_px: u32,
    /// Display height in physical pixels
    pub height_px: u32,
    /// Scale factor relative to a 160 dpi screen
    pub density: f32,
    /// Screen density in dots per inch
    pub density_dpi: u32,
    /// Height of the status bar in physical pixels
    pub status_bar_height: u32,
    /// Height of the title bar in physical pixels
    pub title_bar_height: u32,
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self {
            width_px: 480,
            height_px: 800,
            density: 1.0,
            density_dpi: 160,
            status_bar_height: 0,
            title_bar_height: 0,
        }
    }
}

/// Capability flags known when the host is set up
///
/// These replace runtime probing: the host decides once what it can do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceFeatures {
    /// Device has telephony hardware
    pub telephony: bool,
    /// App may send SMS
    pub sms_permission: bool,
    /// App may place calls
    pub call_permission: bool,
    /// Platform exposes a calendar insertion API
    pub calendar_api: bool,
}

impl DeviceFeatures {
    /// Every capability present
    pub fn all() -> Self {
        Self {
            telephony: true,
            sms_permission: true,
            call_permission: true,
            calendar_api: true,
        }
    }
}

/// Static device information
pub trait DeviceInfo {
    /// Current display metrics
    fn display_metrics(&self) -> DisplayMetrics;

    /// Capability flags
    fn device_features(&self) -> DeviceFeatures;
}
