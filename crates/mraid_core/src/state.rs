//! Ad view states and per-controller policies

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display state of an ad, as seen by the payload
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    /// In its layout slot, invisible
    Hidden,
    /// Waiting for the first content
    #[default]
    Loading,
    /// In its layout slot, visible
    Default,
    /// Promoted to an overlay above the host content
    Expanded,
}

impl ViewState {
    /// Protocol name of the state
    pub fn as_str(self) -> &'static str {
        match self {
            ViewState::Hidden => "hidden",
            ViewState::Loading => "loading",
            ViewState::Default => "default",
            ViewState::Expanded => "expanded",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `expand` does anything for this ad
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStyle {
    #[default]
    Enabled,
    Disabled,
}

/// Native close button policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeCloseButtonStyle {
    AlwaysVisible,
    AlwaysHidden,
    /// Visible unless the ad supplies its own close control
    #[default]
    AdControlled,
}

/// Where the ad is placed in the host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    #[default]
    Inline,
    Interstitial,
}

impl PlacementType {
    /// Protocol name of the placement
    pub fn as_str(self) -> &'static str {
        match self {
            PlacementType::Inline => "inline",
            PlacementType::Interstitial => "interstitial",
        }
    }
}
