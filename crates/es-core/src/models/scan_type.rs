use crate::{CoreError, CoreResult};

use std::panic::Location;
use std::str::FromStr;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// Depth of an engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanType {
    Deep,
    Quick,
    Compliance,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deep => "deep",
            Self::Quick => "quick",
            Self::Compliance => "compliance",
        }
    }
}

impl FromStr for ScanType {
    type Err = CoreError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "deep" => Ok(Self::Deep),
            "quick" => Ok(Self::Quick),
            "compliance" => Ok(Self::Compliance),
            _ => Err(CoreError::InvalidScanType {
                value: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}

impl std::fmt::Display for ScanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
