use crate::{CoreError, CoreResult};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// What a scan points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    /// Network endpoint reachable over HTTP(S)
    Url,
    /// Source repository
    Repository,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Repository => "repository",
        }
    }
}

impl FromStr for TargetType {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "url" => Ok(Self::Url),
            "repository" => Ok(Self::Repository),
            _ => Err(CoreError::InvalidTargetType {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
