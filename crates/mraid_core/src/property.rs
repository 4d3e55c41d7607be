//! Properties pushed to the ad payload
//!
//! Each change event carries one or more properties, rendered together into
//! a single JSON object such as `{"state":"expanded","viewable":true}`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::state::ViewState;

/// Device capabilities advertised to the payload
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Supports {
    pub sms: bool,
    pub tel: bool,
    pub calendar: bool,
    pub inline_video: bool,
    pub store_picture: bool,
}

/// A single payload-visible property
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MraidProperty {
    State(ViewState),
    Viewable(bool),
    /// Screen size in density-independent pixels
    ScreenSize { width: u32, height: u32 },
    Supports(Supports),
}

impl MraidProperty {
    /// JSON key of the property
    pub fn key(&self) -> &'static str {
        match self {
            MraidProperty::State(_) => "state",
            MraidProperty::Viewable(_) => "viewable",
            MraidProperty::ScreenSize { .. } => "screenSize",
            MraidProperty::Supports(_) => "supports",
        }
    }

    /// JSON value of the property
    pub fn value(&self) -> Value {
        match self {
            MraidProperty::State(state) => Value::from(state.as_str()),
            MraidProperty::Viewable(viewable) => Value::from(*viewable),
            MraidProperty::ScreenSize { width, height } => {
                serde_json::json!({ "width": width, "height": height })
            }
            MraidProperty::Supports(supports) => {
                serde_json::to_value(supports).unwrap_or(Value::Null)
            }
        }
    }
}

/// Render a batch of properties into one JSON object
///
/// A later property with the same key replaces an earlier one.
pub fn properties_to_json(properties: &[MraidProperty]) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|property| (property.key().to_string(), property.value()))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_property_json() {
        let json = properties_to_json(&[MraidProperty::State(ViewState::Expanded)]);
        assert_eq!(json.to_string(), r#"{"state":"expanded"}"#);
    }

    #[test]
    fn test_batched_properties() {
        let json = properties_to_json(&[
            MraidProperty::ScreenSize {
                width: 320,
                height: 480,
            },
            MraidProperty::Viewable(true),
        ]);
        assert_eq!(json["screenSize"]["width"], 320);
        assert_eq!(json["screenSize"]["height"], 480);
        assert_eq!(json["viewable"], true);
    }

    #[test]
    fn test_supports_uses_camel_case() {
        let supports = Supports {
            sms: false,
            tel: true,
            calendar: true,
            inline_video: true,
            store_picture: true,
        };
        let json = properties_to_json(&[MraidProperty::Supports(supports)]);
        assert_eq!(json["supports"]["inlineVideo"], true);
        assert_eq!(json["supports"]["storePicture"], true);
        assert_eq!(json["supports"]["sms"], false);
    }
}
