//! The six dramatic shapes.

use crate::{BeatFunction, Intensity};
use serde::{Deserialize, Serialize};
use BeatFunction::{Complicate, Escalate, Establish, Punctuate, React, Resolve, Turn};
use Intensity::{Calm, High, Low, Moderate, Peak};

/// Beats in every shape.
pub const SHAPE_BEAT_COUNT: usize = 7;

/// A fixed dramatic shape: seven narrative functions and an intensity curve.
///
/// # Examples
///
/// ```
/// use timepoint_arc::{ArcShape, BeatFunction, Intensity};
///
/// let shape = ArcShape::Climactic;
/// assert_eq!(shape.functions()[0], BeatFunction::Establish);
/// assert_eq!(shape.curve().iter().max(), Some(&Intensity::Peak));
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
pub enum ArcShape {
    /// Pressure builds without release
    RisingAction,
    /// Build to a climax, then settle
    Climactic,
    /// High standing collapses
    TragicFall,
    /// Even, stepwise escalation
    SteadyEscalation,
    /// Climb, peak, then collapse
    RiseAndFall,
    /// Things only get worse
    Downward,
}

impl ArcShape {
    /// Narrative function of each beat.
    pub fn functions(self) -> &'static [BeatFunction; SHAPE_BEAT_COUNT] {
        match self {
            ArcShape::RisingAction => {
                &[Establish, Complicate, React, Escalate, React, Turn, Punctuate]
            }
            ArcShape::Climactic => {
                &[Establish, Complicate, Escalate, React, Turn, Resolve, Punctuate]
            }
            ArcShape::TragicFall => &[Establish, React, Complicate, Turn, Escalate, React, Resolve],
            ArcShape::SteadyEscalation => {
                &[Establish, Complicate, React, Escalate, React, Escalate, Punctuate]
            }
            ArcShape::RiseAndFall => &[Establish, Escalate, React, Turn, Complicate, React, Resolve],
            ArcShape::Downward => {
                &[Establish, Complicate, React, Escalate, Complicate, React, Punctuate]
            }
        }
    }

    /// Target intensity of each beat.
    pub fn curve(self) -> &'static [Intensity; SHAPE_BEAT_COUNT] {
        match self {
            ArcShape::RisingAction => &[Calm, Low, Low, Moderate, High, High, Peak],
            ArcShape::Climactic => &[Low, Moderate, High, High, Peak, Moderate, Low],
            ArcShape::TragicFall => &[High, High, Moderate, Peak, High, Low, Calm],
            ArcShape::SteadyEscalation => &[Low, Low, Moderate, Moderate, High, High, Peak],
            ArcShape::RiseAndFall => &[Low, Moderate, High, Peak, High, Low, Calm],
            ArcShape::Downward => &[Moderate, Moderate, High, High, High, Peak, Peak],
        }
    }
}
