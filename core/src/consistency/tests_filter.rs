use super::{clamp_distance_bounds, ConsistencyFilter, FilterDecision, RejectReason, Rewrite};
use crate::config::SolverConfig;
use crate::constraints::{ConstraintKind, ConstraintRequest, Target};
use crate::scene::{EntityId, EntitySpec, SceneRegistry, VoidSpec};

fn living_room() -> SceneRegistry {
    let entities = [
        EntitySpec::new("sofa", 2.0, 1.0, 0.8).at(2.0, 0.5, 0.4).rotated(std::f64::consts::PI).frozen(),
        EntitySpec::new("table", 0.6, 0.6, 0.5).at(2.0, 1.1, 0.25),
        EntitySpec::new("chair", 0.5, 0.5, 0.9).at(3.5, 2.5, 0.45),
        EntitySpec::new("lamp", 0.2, 0.2, 0.4).at(1.5, 4.2, 0.2),
        EntitySpec::new("pendant", 0.4, 0.4, 0.3).at(2.0, 2.5, 3.0).on_ceiling(),
    ];
    let voids = [VoidSpec { id: "void_door".into(), center: [0.0, 2.5], size: [0.1, 0.9], rotation: 0.0 }];
    SceneRegistry::new(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 5.0], [0.0, 5.0]], &entities, &voids).expect("scene")
}

fn run(requests: &[ConstraintRequest]) -> super::FilterOutput {
    ConsistencyFilter::apply(&living_room(), requests, &SolverConfig::default())
}

fn rejected(output: &super::FilterOutput, index: usize) -> Option<RejectReason> {
    match &output.transcript[index].decision {
        FilterDecision::Rejected(r) => Some(r.clone()),
        _ => None,
    }
}

#[test]
fn test_clamp_is_idempotent() {
    let cases = [
        (Some(0.3), Some(0.6), 0.6, 0.8),
        (Some(2.0), Some(3.0), 1.0, 0.5),
        (None, Some(0.1), 2.0, 0.3),
        (Some(5.0), Some(1.0), 0.2, 0.4),
        (Some(-1.0), None, 0.9, 0.25),
        (Some(0.0), Some(f64::NAN), 0.05, 0.5),
    ];
    for (min, max, current, floor) in cases {
        let once = clamp_distance_bounds(min, max, current, floor);
        let twice = clamp_distance_bounds(once.0, once.1, current, floor);
        assert_eq!(once, twice, "clamp not idempotent for {:?}", (min, max, current, floor));
        if let (Some(lo), Some(hi)) = once {
            assert!(lo <= hi);
        }
    }
}

#[test]
fn test_clamp_values() {
    let (lo, hi) = clamp_distance_bounds(Some(0.3), Some(0.6), 0.6, 0.8);
    assert!((lo.expect("min") - 0.8).abs() < 1e-12);
    assert!((hi.expect("max") - 1.2).abs() < 1e-12);

    // Missing bounds stay open
    assert_eq!(clamp_distance_bounds(None, None, 1.0, 0.5), (None, None));

    // Reversed bounds are reordered before clamping
    let (lo, hi) = clamp_distance_bounds(Some(3.0), Some(1.0), 2.0, 0.2);
    assert_eq!(lo, Some(1.0));
    assert_eq!(hi, Some(3.0));
}

#[test]
fn test_distance_bounds_rewritten() {
    let out = run(&[ConstraintRequest::distance("table", "sofa", Some(0.3), Some(0.6))]);
    assert_eq!(out.constraints.len(), 1);
    match &out.constraints[0].kind {
        ConstraintKind::Distance { min, max, .. } => {
            assert!((min.expect("min") - 0.8).abs() < 1e-9);
            assert!((max.expect("max") - 1.2).abs() < 1e-9);
        }
        other => panic!("unexpected kind {:?}", other),
    }
    assert!(matches!(
        out.transcript[0].decision,
        FilterDecision::Rewritten(Rewrite::DistanceBounds { .. })
    ));
    assert!(out.transcript[0].message.contains("(updated)"));
}

#[test]
fn test_against_wall_retargets_nearest_wall() {
    // Table sits near wall 0 whatever the caller asked for
    let out = run(&[
        ConstraintRequest::new(ConstraintKind::AgainstWall, "table", "walls_2"),
        ConstraintRequest::new(ConstraintKind::AgainstWall, "chair", "walls_1"),
        ConstraintRequest::against_wall("lamp"),
    ]);
    assert_eq!(out.constraints.len(), 3);
    assert_eq!(out.constraints[0].target, EntityId::from("walls_0"));
    assert_eq!(out.constraints[1].target, EntityId::from("walls_1"));
    assert_eq!(out.constraints[2].target, EntityId::from("walls_2"));

    assert_eq!(
        out.transcript[0].decision,
        FilterDecision::Rewritten(Rewrite::WallTarget {
            requested: Some("walls_2".into()),
            chosen: "walls_0".into(),
        })
    );
    assert_eq!(out.transcript[1].decision, FilterDecision::Accepted);
}

#[test]
fn test_one_wall_and_one_orientation_per_subject() {
    let out = run(&[
        ConstraintRequest::against_wall("chair"),
        ConstraintRequest::against_wall("chair"),
        ConstraintRequest::new(ConstraintKind::PointTowards { angle: 0.0 }, "chair", "table"),
        ConstraintRequest::new(ConstraintKind::AlignWith { angle: 0.0 }, "chair", "sofa"),
    ]);
    assert_eq!(out.constraints.len(), 2);
    assert_eq!(rejected(&out, 1), Some(RejectReason::DuplicateWall));
    assert_eq!(rejected(&out, 3), Some(RejectReason::DuplicateOrientation));
}

#[test]
fn test_unknown_and_invalid_references_dropped() {
    let out = run(&[
        ConstraintRequest::distance("ghost", "sofa", None, Some(1.0)),
        ConstraintRequest::distance("table", "ghost", None, Some(1.0)),
        ConstraintRequest::distance("table", "table", None, Some(1.0)),
        ConstraintRequest::distance("sofa", "table", None, Some(1.0)),
        ConstraintRequest::distance("walls_0", "table", None, Some(1.0)),
        ConstraintRequest::new(ConstraintKind::PointTowards { angle: 0.0 }, "table", "void_door"),
        ConstraintRequest {
            kind: ConstraintKind::AlignWith { angle: 0.0 },
            subject: "table".into(),
            target: None,
        },
    ]);
    assert!(out.constraints.is_empty());
    assert_eq!(rejected(&out, 0), Some(RejectReason::UnknownEntity("ghost".into())));
    assert_eq!(rejected(&out, 1), Some(RejectReason::UnknownEntity("ghost".into())));
    assert_eq!(rejected(&out, 2), Some(RejectReason::SelfReference));
    assert_eq!(rejected(&out, 3), Some(RejectReason::FrozenSubject("sofa".into())));
    assert_eq!(rejected(&out, 4), Some(RejectReason::InvalidSubject("walls_0".into())));
    assert!(matches!(rejected(&out, 5), Some(RejectReason::InvalidTarget { .. })));
    assert_eq!(rejected(&out, 6), Some(RejectReason::MissingTarget));
    assert_eq!(out.transcript.len(), 7);
}

#[test]
fn test_distance_limit_exempts_voids() {
    let out = run(&[
        ConstraintRequest::distance("chair", "sofa", None, Some(3.0)),
        ConstraintRequest::distance("chair", "table", None, Some(3.0)),
        ConstraintRequest::distance("chair", "lamp", None, Some(3.0)),
        ConstraintRequest::distance("chair", "walls_3", None, Some(5.0)),
        ConstraintRequest::distance("chair", "void_door", Some(1.0), None),
    ]);
    assert_eq!(out.constraints.len(), 4);
    assert_eq!(rejected(&out, 3), Some(RejectReason::TooManyDistances { limit: 3 }));
    assert!(rejected(&out, 4).is_none());
}

#[test]
fn test_ceiling_distance_rejected() {
    let out = run(&[
        ConstraintRequest::distance("table", "pendant", None, Some(1.0)),
        ConstraintRequest::distance("pendant", "table", None, Some(1.0)),
    ]);
    assert!(out.constraints.is_empty());
    assert_eq!(rejected(&out, 0), Some(RejectReason::CeilingDistance));
    assert_eq!(rejected(&out, 1), Some(RejectReason::CeilingDistance));
}

#[test]
fn test_exact_duplicate_rejected() {
    let out = run(&[
        ConstraintRequest::new(ConstraintKind::SkipOverlap, "table", "chair"),
        ConstraintRequest::new(ConstraintKind::SkipOverlap, "table", "chair"),
    ]);
    assert_eq!(out.constraints.len(), 1);
    assert_eq!(rejected(&out, 1), Some(RejectReason::Duplicate));
    assert!(out.excluded.contains(&"chair".into(), &"table".into()));
}

#[test]
fn test_stacking_single_parent_and_no_cycles() {
    let out = run(&[
        ConstraintRequest::new(ConstraintKind::OnTopOf, "lamp", "table"),
        ConstraintRequest::new(ConstraintKind::OnTopOf, "lamp", "chair"),
        ConstraintRequest::new(ConstraintKind::OnTopOf, "table", "lamp"),
        ConstraintRequest::new(ConstraintKind::OnTopOf, "chair", Target::Point([1.0, 1.0])),
    ]);
    assert_eq!(out.stacking.len(), 1);
    assert_eq!(out.stacking.get(&EntityId::from("lamp")), Some(&EntityId::from("table")));
    assert_eq!(rejected(&out, 1), Some(RejectReason::DuplicateParent("table".into())));
    assert_eq!(rejected(&out, 2), Some(RejectReason::StackingCycle));
    assert!(matches!(rejected(&out, 3), Some(RejectReason::InvalidTarget { .. })));
    assert!(out.excluded.contains(&"table".into(), &"lamp".into()));
}

#[test]
fn test_point_targets_become_fixed_points() {
    let out = run(&[
        ConstraintRequest::new(ConstraintKind::PointTowards { angle: 0.0 }, "chair", [2.0, 5.0]),
        ConstraintRequest::new(ConstraintKind::Distance { min: None, max: Some(0.5), weight: 1.0 }, "table", [1.0, 1.0]),
        ConstraintRequest::new(ConstraintKind::AlignWith { angle: 0.0 }, "lamp", [1.0, 1.0]),
    ]);
    assert_eq!(out.constraints.len(), 2);
    assert_eq!(out.fixed_points.len(), 2);
    assert_eq!(out.constraints[0].target, EntityId::from("fixed_point_0"));
    assert_eq!(out.constraints[1].target, EntityId::from("fixed_point_1"));
    assert_eq!(out.fixed_points[1].position, [1.0, 1.0]);
    assert!(matches!(rejected(&out, 2), Some(RejectReason::InvalidTarget { .. })));
}
