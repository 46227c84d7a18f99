//! Scene cast.

use serde::{Deserialize, Serialize};

/// How central a character is to the scene.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CastTier {
    /// Drives the scene
    Focal,
    /// Has lines of their own
    #[default]
    Supporting,
    /// Atmosphere, the odd remark
    Background,
}

/// A character available to speak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    /// Display name, unique within a cast
    pub name: String,
    /// Tier
    #[serde(default)]
    pub tier: CastTier,
}

impl CastMember {
    /// Create a cast member.
    pub fn new(name: impl Into<String>, tier: CastTier) -> Self {
        Self {
            name: name.into(),
            tier,
        }
    }
}
