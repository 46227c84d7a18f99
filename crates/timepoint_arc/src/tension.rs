//! Tension descriptors as produced by the judging step.

use crate::ArcShape;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use timepoint_error::{ArcError, ArcErrorKind};

/// The tension category a scene was judged to have.
///
/// Parsing is case-insensitive and treats `-`, `_` and spaces alike, so
/// `"Tragic-Fall"`, `"tragic_fall"` and `"tragic fall"` are equivalent. A few
/// common synonyms are accepted as well.
///
/// # Examples
///
/// ```
/// use timepoint_arc::{ArcShape, TensionDescriptor};
///
/// let tension: TensionDescriptor = "Rags to Riches to Fall".parse().unwrap();
/// assert_eq!(tension, TensionDescriptor::RagsToRichesToFall);
/// assert_eq!(tension.shape(), ArcShape::RiseAndFall);
///
/// assert!("whimsical".parse::<TensionDescriptor>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TensionDescriptor {
    /// Building pressure
    Rising,
    /// Builds to a decisive moment
    Climactic,
    /// A downfall
    TragicFall,
    /// Constant upward pressure
    SteadyEscalation,
    /// Success followed by ruin
    RagsToRichesToFall,
    /// A deteriorating situation
    Worsening,
}

impl TensionDescriptor {
    /// The dramatic shape this descriptor maps to.
    pub fn shape(self) -> ArcShape {
        match self {
            TensionDescriptor::Rising => ArcShape::RisingAction,
            TensionDescriptor::Climactic => ArcShape::Climactic,
            TensionDescriptor::TragicFall => ArcShape::TragicFall,
            TensionDescriptor::SteadyEscalation => ArcShape::SteadyEscalation,
            TensionDescriptor::RagsToRichesToFall => ArcShape::RiseAndFall,
            TensionDescriptor::Worsening => ArcShape::Downward,
        }
    }
}

impl FromStr for TensionDescriptor {
    type Err = ArcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .to_lowercase()
            .replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let descriptor = match normalized.as_str() {
            "rising" | "rising action" | "building" => TensionDescriptor::Rising,
            "climactic" | "climax" => TensionDescriptor::Climactic,
            "tragic fall" | "tragic" | "downfall" => TensionDescriptor::TragicFall,
            "steady escalation" | "escalating" | "slow burn" => TensionDescriptor::SteadyEscalation,
            "rags to riches to fall" | "rise and fall" | "icarus" => {
                TensionDescriptor::RagsToRichesToFall
            }
            "worsening" | "downward" | "downward spiral" | "deteriorating" => {
                TensionDescriptor::Worsening
            }
            _ => {
                return Err(ArcError::new(ArcErrorKind::UnknownTension(s.to_string())));
            }
        };
        Ok(descriptor)
    }
}
