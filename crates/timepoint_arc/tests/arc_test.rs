use strum::IntoEnumIterator;
use timepoint_arc::{
    build_arc, ArcShape, BeatFunction, CastMember, CastTier, SpeakerRole, TensionDescriptor,
    SHAPE_BEAT_COUNT,
};
use timepoint_error::ArcErrorKind;

fn roman_cast() -> Vec<CastMember> {
    vec![
        CastMember::new("Casca", CastTier::Supporting),
        CastMember::new("Caesar", CastTier::Focal),
        CastMember::new("Soothsayer", CastTier::Background),
        CastMember::new("Brutus", CastTier::Focal),
        CastMember::new("Crowd", CastTier::Background),
    ]
}

#[test]
fn descriptor_parsing_tolerates_separators_and_case() {
    for input in ["tragic fall", "Tragic-Fall", "TRAGIC_FALL", "  tragic   fall "] {
        let parsed: TensionDescriptor = input.parse().unwrap();
        assert_eq!(parsed, TensionDescriptor::TragicFall, "{input}");
    }
    assert_eq!(
        "downward spiral".parse::<TensionDescriptor>().unwrap(),
        TensionDescriptor::Worsening
    );
}

#[test]
fn unknown_descriptor_is_rejected() {
    let err = "bittersweet".parse::<TensionDescriptor>().unwrap_err();
    assert!(matches!(err.kind, ArcErrorKind::UnknownTension(ref s) if s == "bittersweet"));
}

#[test]
fn descriptor_display_round_trips() {
    for descriptor in TensionDescriptor::iter() {
        let parsed: TensionDescriptor = descriptor.to_string().parse().unwrap();
        assert_eq!(parsed, descriptor);
    }
}

#[test]
fn each_descriptor_maps_to_a_distinct_shape() {
    let shapes: std::collections::HashSet<ArcShape> =
        TensionDescriptor::iter().map(|d| d.shape()).collect();
    assert_eq!(shapes.len(), ArcShape::iter().count());
}

#[test]
fn arc_has_fixed_length_and_records_request() {
    let arc = build_arc(TensionDescriptor::Climactic, 20, &roman_cast()).unwrap();

    assert_eq!(arc.beats().len(), SHAPE_BEAT_COUNT);
    assert_eq!(*arc.requested_beats(), 20);
    assert_eq!(*arc.shape(), ArcShape::Climactic);
    for (index, beat) in arc.beats().iter().enumerate() {
        assert_eq!(*beat.index(), index);
        assert_eq!(*beat.role(), beat.function().role());
    }
}

#[test]
fn intensities_follow_the_shape_curve() {
    let arc = build_arc(TensionDescriptor::Rising, 7, &roman_cast()).unwrap();
    let intensities: Vec<_> = arc.beats().iter().map(|b| *b.intensity()).collect();
    assert_eq!(intensities.as_slice(), ArcShape::RisingAction.curve());
    assert!(intensities.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn focal_beats_go_to_focal_pair() {
    let arc = build_arc(TensionDescriptor::Climactic, 7, &roman_cast()).unwrap();

    for beat in arc.beats() {
        if *beat.role() == SpeakerRole::Focal {
            assert!(
                beat.speaker() == "Caesar" || beat.speaker() == "Brutus",
                "{:?}",
                beat
            );
        }
    }
    assert_eq!(arc.beats()[0].speaker(), "Caesar");
}

#[test]
fn punctuate_prefers_unheard_background() {
    let arc = build_arc(TensionDescriptor::Climactic, 7, &roman_cast()).unwrap();
    let last = arc.beats().last().unwrap();

    assert_eq!(*last.function(), BeatFunction::Punctuate);
    assert_eq!(last.speaker(), "Soothsayer");
}

#[test]
fn react_goes_to_someone_else() {
    let arc = build_arc(TensionDescriptor::SteadyEscalation, 7, &roman_cast()).unwrap();
    let speakers = arc.speakers();

    for (index, beat) in arc.beats().iter().enumerate().skip(1) {
        if *beat.function() == BeatFunction::React {
            assert_ne!(beat.speaker(), speakers[index - 1]);
            assert_eq!(beat.speaker(), "Casca");
        }
    }
}

#[test]
fn missing_background_falls_back_to_rotation() {
    let cast = vec![
        CastMember::new("Ada", CastTier::Focal),
        CastMember::new("Grace", CastTier::Focal),
    ];
    let arc = build_arc(TensionDescriptor::Worsening, 7, &cast).unwrap();

    let speakers = arc.speakers();
    assert!(speakers.windows(2).all(|pair| pair[0] != pair[1]), "{:?}", speakers);
}

#[test]
fn heard_background_falls_back_to_rotation() {
    let cast = vec![
        CastMember::new("Bob", CastTier::Background),
        CastMember::new("Ada", CastTier::Focal),
        CastMember::new("Grace", CastTier::Focal),
    ];
    let arc = build_arc(TensionDescriptor::Worsening, 7, &cast).unwrap();
    let speakers = arc.speakers();

    assert_eq!(
        speakers,
        vec!["Ada", "Grace", "Bob", "Ada", "Grace", "Ada", "Grace"]
    );
    let last = arc.beats().last().unwrap();
    assert_eq!(*last.function(), BeatFunction::Punctuate);
    assert_ne!(last.speaker(), "Bob");
}

#[test]
fn single_member_cast_speaks_every_beat() {
    let cast = vec![CastMember::new("Narrator", CastTier::Background)];
    let arc = build_arc(TensionDescriptor::TragicFall, 3, &cast).unwrap();

    assert!(arc.speakers().iter().all(|name| *name == "Narrator"));
}

#[test]
fn invalid_casts_are_rejected() {
    let empty = build_arc(TensionDescriptor::Rising, 7, &[]).unwrap_err();
    assert_eq!(empty.kind, ArcErrorKind::EmptyCast);

    let twins = vec![
        CastMember::new("Twin", CastTier::Focal),
        CastMember::new("Twin", CastTier::Supporting),
    ];
    let err = build_arc(TensionDescriptor::Rising, 7, &twins).unwrap_err();
    assert!(matches!(err.kind, ArcErrorKind::DuplicateCastMember(_)));
}

#[test]
fn arc_serializes_for_step_input() {
    let arc = build_arc(TensionDescriptor::RagsToRichesToFall, 7, &roman_cast()).unwrap();
    let value = serde_json::to_value(&arc).unwrap();

    assert_eq!(value["shape"], "rise_and_fall");
    assert_eq!(value["beats"].as_array().unwrap().len(), 7);
    assert_eq!(value["beats"][0]["function"], "establish");

    let back: timepoint_arc::NarrativeArc = serde_json::from_value(value).unwrap();
    assert_eq!(back, arc);
}
