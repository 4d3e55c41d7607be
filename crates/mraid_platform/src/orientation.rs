//! Screen orientation and rotation notifications

use crate::error::Result;

/// Orientation preference requested by the host window
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RequestedOrientation {
    /// No preference, the system decides
    #[default]
    Unspecified,
    Portrait,
    Landscape,
    /// Follow the sensor
    Sensor,
    /// Host-specific value
    Other(i32),
}

/// Physical orientation of the device
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    #[default]
    Undefined,
    Portrait,
    Landscape,
    Square,
}

impl RequestedOrientation {
    /// The preference that freezes the display in `orientation`
    pub fn locked_to(orientation: DeviceOrientation) -> Self {
        match orientation {
            DeviceOrientation::Portrait => RequestedOrientation::Portrait,
            DeviceOrientation::Landscape => RequestedOrientation::Landscape,
            DeviceOrientation::Square | DeviceOrientation::Undefined => {
                RequestedOrientation::Unspecified
            }
        }
    }
}

/// Display rotation relative to the natural orientation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Rotation in degrees
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Parse a rotation from degrees (multiples of 90, any sign)
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

/// Callback invoked by the host on a configuration change
pub type ConfigurationListener = Box<dyn Fn() + Send>;

/// Token identifying a registered configuration listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerToken(pub u64);

/// Host orientation control
pub trait OrientationHost {
    /// Orientation preference currently requested by the host window
    ///
    /// Returns `PlatformError::Unsupported` when the host context cannot
    /// control orientation.
    fn requested_orientation(&self) -> Result<RequestedOrientation>;

    /// Change the requested orientation
    fn set_requested_orientation(&mut self, orientation: RequestedOrientation) -> Result<()>;

    /// Current physical orientation
    fn device_orientation(&self) -> DeviceOrientation;

    /// Current display rotation
    fn display_rotation(&self) -> Rotation;

    /// Register for configuration-change notifications
    fn register_configuration_listener(
        &mut self,
        listener: ConfigurationListener,
    ) -> Result<ListenerToken>;

    /// Unregister a configuration listener
    ///
    /// Returns `PlatformError::NotRegistered` for unknown tokens.
    fn unregister_configuration_listener(&mut self, token: ListenerToken) -> Result<()>;
}
