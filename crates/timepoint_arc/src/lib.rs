//! Narrative arc engine for Timepoint dialog.
//!
//! A tension descriptor picks one of six fixed dramatic shapes. Each shape
//! defines seven beats, and [`build_arc`] assigns every beat an intensity and
//! a speaker in one linear pass over the beats:
//!
//! ```
//! use timepoint_arc::{build_arc, CastMember, CastTier, TensionDescriptor};
//!
//! let cast = vec![
//!     CastMember::new("Caesar", CastTier::Focal),
//!     CastMember::new("Brutus", CastTier::Focal),
//!     CastMember::new("Casca", CastTier::Supporting),
//!     CastMember::new("Soothsayer", CastTier::Background),
//! ];
//!
//! let tension: TensionDescriptor = "tragic-fall".parse().unwrap();
//! let arc = build_arc(tension, 12, &cast).unwrap();
//!
//! assert_eq!(arc.beats().len(), 7);
//! assert_eq!(*arc.requested_beats(), 12);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod beat;
mod cast;
mod engine;
mod shape;
mod tension;

pub use beat::{Beat, BeatFunction, Intensity, NarrativeArc, SpeakerRole};
pub use cast::{CastMember, CastTier};
pub use engine::build_arc;
pub use shape::{ArcShape, SHAPE_BEAT_COUNT};
pub use tension::TensionDescriptor;
