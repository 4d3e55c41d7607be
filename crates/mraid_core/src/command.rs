//! Typed payload commands
//!
//! The scripting bridge hands the controller a command name and a flat
//! string map of parameters. [`MraidCommand::from_params`] is the single
//! place that map is interpreted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{MraidError, Result};

/// Wire names of every command the controller understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandName {
    Expand,
    Close,
    UseCustomClose,
    CreateCalendarEvent,
    StorePicture,
    PlayVideo,
    GetCurrentPosition,
    GetDefaultPosition,
    GetMaxSize,
    GetScreenSize,
}

impl CommandName {
    pub const ALL: [CommandName; 10] = [
        CommandName::Expand,
        CommandName::Close,
        CommandName::UseCustomClose,
        CommandName::CreateCalendarEvent,
        CommandName::StorePicture,
        CommandName::PlayVideo,
        CommandName::GetCurrentPosition,
        CommandName::GetDefaultPosition,
        CommandName::GetMaxSize,
        CommandName::GetScreenSize,
    ];

    /// Name as it appears on the bridge
    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::Expand => "expand",
            CommandName::Close => "close",
            CommandName::UseCustomClose => "usecustomclose",
            CommandName::CreateCalendarEvent => "createCalendarEvent",
            CommandName::StorePicture => "storePicture",
            CommandName::PlayVideo => "playVideo",
            CommandName::GetCurrentPosition => "getCurrentPosition",
            CommandName::GetDefaultPosition => "getDefaultPosition",
            CommandName::GetMaxSize => "getMaxSize",
            CommandName::GetScreenSize => "getScreenSize",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = MraidError;

    fn from_str(s: &str) -> Result<Self> {
        CommandName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| MraidError::UnknownCommand(s.to_string()))
    }
}

/// Parameters of an `expand` request
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandRequest {
    /// Secondary content to load instead of re-hosting the current surface
    pub url: Option<String>,
    /// Requested width in density-independent pixels
    pub width: u32,
    /// Requested height in density-independent pixels
    pub height: u32,
    pub use_custom_close: bool,
    pub lock_orientation: bool,
}

/// A command issued by the ad payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MraidCommand {
    Expand(ExpandRequest),
    Close,
    UseCustomClose(bool),
    CreateCalendarEvent(HashMap<String, String>),
    StorePicture { uri: String },
    PlayVideo { uri: String },
    GetCurrentPosition,
    GetDefaultPosition,
    GetMaxSize,
    GetScreenSize,
}

impl MraidCommand {
    pub fn name(&self) -> CommandName {
        match self {
            MraidCommand::Expand(_) => CommandName::Expand,
            MraidCommand::Close => CommandName::Close,
            MraidCommand::UseCustomClose(_) => CommandName::UseCustomClose,
            MraidCommand::CreateCalendarEvent(_) => CommandName::CreateCalendarEvent,
            MraidCommand::StorePicture { .. } => CommandName::StorePicture,
            MraidCommand::PlayVideo { .. } => CommandName::PlayVideo,
            MraidCommand::GetCurrentPosition => CommandName::GetCurrentPosition,
            MraidCommand::GetDefaultPosition => CommandName::GetDefaultPosition,
            MraidCommand::GetMaxSize => CommandName::GetMaxSize,
            MraidCommand::GetScreenSize => CommandName::GetScreenSize,
        }
    }

    /// Build a typed command from the bridge's raw name and parameters
    ///
    /// Missing numeric and boolean parameters default to zero and `false`.
    /// `createCalendarEvent` keeps its map untouched; it is validated later
    /// by [`crate::calendar::translate_calendar_request`].
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> Result<Self> {
        let command = name.parse::<CommandName>()?;
        let reader = ParamReader { command, params };

        Ok(match command {
            CommandName::Expand => MraidCommand::Expand(ExpandRequest {
                url: reader.optional("url"),
                width: reader.int("w")?,
                height: reader.int("h")?,
                use_custom_close: reader.flag("shouldUseCustomClose")?,
                lock_orientation: reader.flag("lockOrientation")?,
            }),
            CommandName::Close => MraidCommand::Close,
            CommandName::UseCustomClose => {
                MraidCommand::UseCustomClose(reader.flag("shouldUseCustomClose")?)
            }
            CommandName::CreateCalendarEvent => MraidCommand::CreateCalendarEvent(params.clone()),
            CommandName::StorePicture => MraidCommand::StorePicture {
                uri: reader.required("uri")?,
            },
            CommandName::PlayVideo => MraidCommand::PlayVideo {
                uri: reader.required("uri")?,
            },
            CommandName::GetCurrentPosition => MraidCommand::GetCurrentPosition,
            CommandName::GetDefaultPosition => MraidCommand::GetDefaultPosition,
            CommandName::GetMaxSize => MraidCommand::GetMaxSize,
            CommandName::GetScreenSize => MraidCommand::GetScreenSize,
        })
    }
}

struct ParamReader<'a> {
    command: CommandName,
    params: &'a HashMap<String, String>,
}

impl ParamReader<'_> {
    fn optional(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key).ok_or_else(|| MraidError::MissingParameter {
            command: self.command,
            key: key.to_string(),
        })
    }

    fn int(&self, key: &str) -> Result<u32> {
        match self.optional(key) {
            None => Ok(0),
            Some(value) => value.parse().map_err(|_| self.invalid(key, value)),
        }
    }

    fn flag(&self, key: &str) -> Result<bool> {
        match self.optional(key) {
            None => Ok(false),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.invalid(key, value)),
            },
        }
    }

    fn invalid(&self, key: &str, value: String) -> MraidError {
        MraidError::InvalidParameter {
            command: self.command,
            key: key.to_string(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_command_names_round_trip() {
        for name in CommandName::ALL {
            assert_eq!(name.as_str().parse::<CommandName>().unwrap(), name);
        }
        assert!(matches!(
            "resize".parse::<CommandName>(),
            Err(MraidError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_expand_from_params() {
        let command = MraidCommand::from_params(
            "expand",
            &params(&[
                ("w", "320"),
                ("h", "480"),
                ("url", "http://ads.example.com/part2.html"),
                ("shouldUseCustomClose", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(
            command,
            MraidCommand::Expand(ExpandRequest {
                url: Some("http://ads.example.com/part2.html".to_string()),
                width: 320,
                height: 480,
                use_custom_close: true,
                lock_orientation: false,
            })
        );
    }

    #[test]
    fn test_expand_blank_url_is_none() {
        let command = MraidCommand::from_params("expand", &params(&[("url", "  ")])).unwrap();
        match command {
            MraidCommand::Expand(request) => assert_eq!(request.url, None),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let err = MraidCommand::from_params("expand", &params(&[("w", "wide")])).unwrap_err();
        assert_eq!(err.command(), Some(CommandName::Expand));

        let err = MraidCommand::from_params("storePicture", &HashMap::new()).unwrap_err();
        assert!(matches!(err, MraidError::MissingParameter { .. }));
        assert_eq!(err.to_string(), "storePicture: missing parameter 'uri'");
    }

    #[test]
    fn test_use_custom_close_flag() {
        let command =
            MraidCommand::from_params("usecustomclose", &params(&[("shouldUseCustomClose", "1")]))
                .unwrap();
        assert_eq!(command, MraidCommand::UseCustomClose(true));
        assert_eq!(command.name(), CommandName::UseCustomClose);
    }
}
