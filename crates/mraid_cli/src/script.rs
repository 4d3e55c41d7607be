//! Replay scripts
//!
//! A script is a JSON document listing the inputs a host would feed a
//! controller:
//!
//! ```json
//! {
//!   "surface": { "width": 320, "height": 50 },
//!   "steps": [
//!     { "op": "content_ready" },
//!     { "op": "command", "name": "expand", "params": { "w": "300", "h": "250" } },
//!     { "op": "wait", "ms": 100 },
//!     { "op": "command", "name": "close" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 320,
            height: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    ContentReady,
    Command {
        name: String,
        #[serde(default)]
        params: HashMap<String, String>,
    },
    ConfigurationChanged,
    AcceptPicture {
        uri: String,
    },
    NativeClose,
    /// Let the loop run for a while
    Wait {
        ms: u64,
    },
    Destroy,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub surface: SurfaceSize,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("Invalid replay script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&source)
    }

    /// Whether the script destroys the controller itself
    pub fn ends_with_destroy(&self) -> bool {
        matches!(self.steps.last(), Some(Step::Destroy))
    }
}
