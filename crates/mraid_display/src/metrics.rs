//! Screen metrics in density-independent pixels

use mraid_platform::DisplayMetrics;

const BASELINE_DPI: f64 = 160.0;

/// Screen size as reported to the payload
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenMetrics {
    /// Scale factor relative to a 160 dpi screen
    pub density: f32,
    /// Usable width in density-independent pixels
    pub width: u32,
    /// Usable height in density-independent pixels, without status and title bars
    pub height: u32,
}

impl ScreenMetrics {
    pub fn from_display(metrics: &DisplayMetrics) -> Self {
        let dpi = if metrics.density_dpi == 0 {
            BASELINE_DPI
        } else {
            metrics.density_dpi as f64
        };
        let usable_height = metrics
            .height_px
            .saturating_sub(metrics.status_bar_height)
            .saturating_sub(metrics.title_bar_height);

        Self {
            density: metrics.density,
            width: (metrics.width_px as f64 * (BASELINE_DPI / dpi)) as u32,
            height: (usable_height as f64 * (BASELINE_DPI / dpi)) as u32,
        }
    }

    /// Convert density-independent pixels to physical pixels, truncating
    pub fn to_px(&self, dp: u32) -> u32 {
        (dp as f32 * self.density) as u32
    }

    /// Convert density-independent pixels to physical pixels, rounding
    pub fn to_px_rounded(&self, dp: u32) -> u32 {
        (dp as f32 * self.density + 0.5) as u32
    }
}
