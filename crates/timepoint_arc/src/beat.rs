//! Beats and the arc that orders them.

use crate::ArcShape;
use serde::{Deserialize, Serialize};

/// What a beat does for the scene.
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
pub enum BeatFunction {
    /// Set up the situation
    Establish,
    /// Introduce friction
    Complicate,
    /// Raise the stakes
    Escalate,
    /// Reverse the direction of the scene
    Turn,
    /// Respond to the previous line
    React,
    /// Settle the conflict
    Resolve,
    /// A short closing remark
    Punctuate,
}

impl BeatFunction {
    /// Speaker role this function prefers.
    pub fn role(self) -> SpeakerRole {
        match self {
            BeatFunction::Establish
            | BeatFunction::Complicate
            | BeatFunction::Escalate
            | BeatFunction::Turn
            | BeatFunction::Resolve => SpeakerRole::Focal,
            BeatFunction::React => SpeakerRole::Reactive,
            BeatFunction::Punctuate => SpeakerRole::Background,
        }
    }
}

/// Target emotional intensity, ordered from calm to peak.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intensity {
    /// Quiet
    Calm,
    /// Mild
    Low,
    /// Engaged
    Moderate,
    /// Heated
    High,
    /// Climax
    Peak,
}

/// Which part of the cast a beat should go to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpeakerRole {
    /// One of the two focal characters
    Focal,
    /// Someone other than the previous speaker
    Reactive,
    /// A background character
    Background,
}

/// One line slot of the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct Beat {
    /// Zero-based position in the arc
    index: usize,
    /// Narrative function
    function: BeatFunction,
    /// Target intensity
    intensity: Intensity,
    /// Preferred speaker role
    role: SpeakerRole,
    /// Assigned speaker name
    speaker: String,
}

impl Beat {
    pub(crate) fn new(
        index: usize,
        function: BeatFunction,
        intensity: Intensity,
        speaker: impl Into<String>,
    ) -> Self {
        Self {
            index,
            function,
            intensity,
            role: function.role(),
            speaker: speaker.into(),
        }
    }
}

/// The dramatic structure handed to the dialog step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct NarrativeArc {
    /// Shape the beats follow
    shape: ArcShape,
    /// Line budget the caller asked for
    requested_beats: usize,
    /// Beats in speaking order
    beats: Vec<Beat>,
}

impl NarrativeArc {
    pub(crate) fn new(shape: ArcShape, requested_beats: usize, beats: Vec<Beat>) -> Self {
        Self {
            shape,
            requested_beats,
            beats,
        }
    }

    /// Speaker names in beat order.
    pub fn speakers(&self) -> Vec<&str> {
        self.beats.iter().map(|beat| beat.speaker.as_str()).collect()
    }
}
