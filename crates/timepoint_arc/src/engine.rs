//! Arc construction and speaker assignment.

use crate::{Beat, CastMember, CastTier, NarrativeArc, SpeakerRole, TensionDescriptor};
use std::collections::HashSet;
use timepoint_error::{ArcError, ArcErrorKind};
use tracing::{debug, instrument};

/// Build the arc for a scene.
///
/// The arc always has [`SHAPE_BEAT_COUNT`](crate::SHAPE_BEAT_COUNT) beats;
/// `beat_count` is recorded as the requested line budget so the dialog step
/// can stretch beats over it. Speakers are chosen in a single pass that only
/// remembers who spoke last, so no speaker gets two consecutive beats unless
/// the cast has one member.
///
/// # Errors
///
/// Returns an error if the cast is empty or two members share a name.
#[instrument(skip(cast), fields(cast_size = cast.len()))]
pub fn build_arc(
    tension: TensionDescriptor,
    beat_count: usize,
    cast: &[CastMember],
) -> Result<NarrativeArc, ArcError> {
    if cast.is_empty() {
        return Err(ArcError::new(ArcErrorKind::EmptyCast));
    }
    let mut names = HashSet::new();
    for member in cast {
        if !names.insert(member.name.as_str()) {
            return Err(ArcError::new(ArcErrorKind::DuplicateCastMember(
                member.name.clone(),
            )));
        }
    }

    let shape = tension.shape();
    let mut picker = SpeakerPicker::new(cast);

    let beats = shape
        .functions()
        .iter()
        .zip(shape.curve().iter())
        .enumerate()
        .map(|(index, (function, intensity))| {
            let speaker = picker.pick(function.role());
            Beat::new(index, *function, *intensity, cast[speaker].name.as_str())
        })
        .collect();

    debug!(%shape, "Built narrative arc");
    Ok(NarrativeArc::new(shape, beat_count, beats))
}

/// Speaker selection state for one pass over the beats.
///
/// Candidate lists are built once per cast; picks only advance cursors over
/// them and never rescan the cast.
struct SpeakerPicker {
    size: usize,
    focal: Vec<usize>,
    supporting: Vec<usize>,
    background: Vec<usize>,
    spoken: Vec<bool>,
    last: Option<usize>,
    supporting_cursor: usize,
    background_cursor: usize,
    rotation: usize,
}

impl SpeakerPicker {
    fn new(cast: &[CastMember]) -> Self {
        let mut focal: Vec<usize> = (0..cast.len()).collect();
        focal.sort_by_key(|&index| cast[index].tier);
        focal.truncate(2);

        let in_tier = |tier: CastTier| -> Vec<usize> {
            (0..cast.len()).filter(|&i| cast[i].tier == tier).collect()
        };

        Self {
            size: cast.len(),
            focal,
            supporting: in_tier(CastTier::Supporting),
            background: in_tier(CastTier::Background),
            spoken: vec![false; cast.len()],
            last: None,
            supporting_cursor: 0,
            background_cursor: 0,
            rotation: 0,
        }
    }

    fn pick(&mut self, role: SpeakerRole) -> usize {
        let chosen = match role {
            SpeakerRole::Focal => self.focal.iter().copied().find(|&i| self.is_fresh(i)),
            SpeakerRole::Reactive => self.next_supporting(),
            SpeakerRole::Background => self.next_unheard_background(),
        }
        .unwrap_or_else(|| self.rotate());

        self.spoken[chosen] = true;
        self.last = Some(chosen);
        chosen
    }

    fn is_fresh(&self, index: usize) -> bool {
        self.last != Some(index)
    }

    /// Next supporting member in turn who did not speak last.
    fn next_supporting(&mut self) -> Option<usize> {
        let count = self.supporting.len();
        for _ in 0..count.min(2) {
            let candidate = self.supporting[self.supporting_cursor % count];
            self.supporting_cursor += 1;
            if self.is_fresh(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// First background member who has not spoken yet.
    fn next_unheard_background(&mut self) -> Option<usize> {
        while let Some(&candidate) = self.background.get(self.background_cursor) {
            if !self.spoken[candidate] {
                return Some(candidate);
            }
            self.background_cursor += 1;
        }
        None
    }

    /// Round-robin over the whole cast, skipping the last speaker when possible.
    fn rotate(&mut self) -> usize {
        for _ in 0..self.size.min(2) {
            let candidate = self.rotation % self.size;
            self.rotation += 1;
            if self.is_fresh(candidate) {
                return candidate;
            }
        }
        self.rotation % self.size
    }
}
