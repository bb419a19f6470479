//! Keypoint detection methods offered by the extraction service.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Detection method sent with every extraction request.
///
/// Serialized as the upper-case name the service expects (`"SIFT"`, `"ORB"`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionMethod {
    #[default]
    Sift,
    Orb,
    Akaze,
    Brisk,
}

impl DetectionMethod {
    /// All methods in the order the picker lists them.
    pub const ALL: [DetectionMethod; 4] = [Self::Sift, Self::Orb, Self::Akaze, Self::Brisk];

    /// Wire name for the `method` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sift => "SIFT",
            Self::Orb => "ORB",
            Self::Akaze => "AKAZE",
            Self::Brisk => "BRISK",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Sift => "Scale-Invariant Feature Transform - robust to scaling",
            Self::Orb => "Oriented FAST - faster, good for real-time",
            Self::Akaze => "Accelerated-KAZE - fast and accurate",
            Self::Brisk => "Binary Robust Invariant - efficient binary descriptor",
        }
    }

    /// Whether the method produces binary descriptors (compared by Hamming distance).
    pub fn has_binary_descriptor(&self) -> bool {
        !matches!(self, Self::Sift)
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid method '{0}'. Choose from: SIFT, ORB, AKAZE, BRISK")]
pub struct UnknownMethod(pub String);

impl FromStr for DetectionMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIFT" => Ok(Self::Sift),
            "ORB" => Ok(Self::Orb),
            "AKAZE" => Ok(Self::Akaze),
            "BRISK" => Ok(Self::Brisk),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}
