//! Verdict synthesis: pixel distance, metadata and manipulation evidence
//! folded into a single confidence label and severity color.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::manipulation::ManipulationEvidence;
use crate::metadata::MetadataComparison;

/// Upper bounds (inclusive) of each pixel-status band.
pub const IDENTICAL_DISTANCE: u32 = 0;
pub const NEAR_IDENTICAL_DISTANCE: u32 = 5;
pub const HIGH_SIMILARITY_DISTANCE: u32 = 15;
pub const MODERATE_SIMILARITY_DISTANCE: u32 = 30;

/// Manipulation score above which a pair is declared manipulated.
pub const MANIPULATION_THRESHOLD: f64 = 0.7;

/// Coarse pixel-similarity band derived from Hamming distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelStatus {
    #[serde(rename = "Identical")]
    Identical,
    #[serde(rename = "Near Identical")]
    NearIdentical,
    #[serde(rename = "High Similarity")]
    HighSimilarity,
    #[serde(rename = "Moderate Similarity")]
    ModerateSimilarity,
    #[serde(rename = "Different Content")]
    DifferentContent,
    #[serde(rename = "Verification Failed")]
    VerificationFailed,
}

impl PixelStatus {
    /// First matching band wins; `None` means the comparison failed.
    pub fn from_distance(distance: Option<u32>) -> Self {
        match distance {
            None => Self::VerificationFailed,
            Some(d) if d == IDENTICAL_DISTANCE => Self::Identical,
            Some(d) if d <= NEAR_IDENTICAL_DISTANCE => Self::NearIdentical,
            Some(d) if d <= HIGH_SIMILARITY_DISTANCE => Self::HighSimilarity,
            Some(d) if d <= MODERATE_SIMILARITY_DISTANCE => Self::ModerateSimilarity,
            Some(_) => Self::DifferentContent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Identical => "Identical",
            Self::NearIdentical => "Near Identical",
            Self::HighSimilarity => "High Similarity",
            Self::ModerateSimilarity => "Moderate Similarity",
            Self::DifferentContent => "Different Content",
            Self::VerificationFailed => "Verification Failed",
        }
    }
}

impl fmt::Display for PixelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict for a query/candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    #[serde(rename = "Perfectly Authentic")]
    PerfectlyAuthentic,
    #[serde(rename = "Likely Authentic/Reused")]
    LikelyAuthentic,
    #[serde(rename = "Definitely Manipulated")]
    DefinitelyManipulated,
    #[serde(rename = "Different Image")]
    DifferentImage,
    #[serde(rename = "Metadata Mismatch")]
    MetadataMismatch,
    #[serde(rename = "Possibly Modified")]
    PossiblyModified,
    #[serde(rename = "Verification Failed")]
    VerificationFailed,
}

impl ConfidenceLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerfectlyAuthentic => "Perfectly Authentic",
            Self::LikelyAuthentic => "Likely Authentic/Reused",
            Self::DefinitelyManipulated => "Definitely Manipulated",
            Self::DifferentImage => "Different Image",
            Self::MetadataMismatch => "Metadata Mismatch",
            Self::PossiblyModified => "Possibly Modified",
            Self::VerificationFailed => "Verification Failed",
        }
    }

    pub fn severity(self) -> SeverityColor {
        SeverityColor::from_label(self.as_str())
    }
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display severity attached to each confidence label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityColor {
    Green,
    Orange,
    Red,
    Gray,
}

impl SeverityColor {
    /// Map a label string to its color. Unknown labels are gray.
    ///
    /// "Authentic" and "Authentic Copy" are never produced by
    /// [`synthesize`] but are still recognized for rendering callers.
    pub fn from_label(label: &str) -> Self {
        match label {
            "Perfectly Authentic" | "Authentic" | "Authentic Copy" => Self::Green,
            "Likely Authentic/Reused" => Self::Orange,
            "Definitely Manipulated" | "Metadata Mismatch" | "Possibly Modified" => Self::Red,
            _ => Self::Gray,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Gray => "gray",
        }
    }
}

impl fmt::Display for SeverityColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the overall confidence label. The first matching rule wins.
pub fn synthesize(
    distance: Option<u32>,
    metadata: &MetadataComparison,
    manipulation: &ManipulationEvidence,
) -> ConfidenceLabel {
    let Some(distance) = distance else {
        return ConfidenceLabel::VerificationFailed;
    };

    if distance == IDENTICAL_DISTANCE && metadata.matches {
        ConfidenceLabel::PerfectlyAuthentic
    } else if distance <= HIGH_SIMILARITY_DISTANCE && !metadata.has_issues() {
        ConfidenceLabel::LikelyAuthentic
    } else if manipulation.score > MANIPULATION_THRESHOLD {
        ConfidenceLabel::DefinitelyManipulated
    } else if distance > MODERATE_SIMILARITY_DISTANCE {
        ConfidenceLabel::DifferentImage
    } else if metadata.has_issues() {
        ConfidenceLabel::MetadataMismatch
    } else {
        ConfidenceLabel::PossiblyModified
    }
}
