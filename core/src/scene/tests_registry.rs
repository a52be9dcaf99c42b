use super::registry::{EntityRef, FixedPoint, SceneRegistry};
use super::types::{EntityId, EntitySpec, StackingMap, VoidSpec};
use crate::error::LayoutError;

fn room() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [4.0, 0.0], [4.0, 5.0], [0.0, 5.0]]
}

#[test]
fn test_walls_are_named_by_edge() {
    let scene = SceneRegistry::new(room(), &[], &[]).expect("scene");
    assert_eq!(scene.resolve(&"walls_0".into()), Some(EntityRef::Wall(0)));
    assert_eq!(scene.resolve(&"walls_3".into()), Some(EntityRef::Wall(3)));
    assert_eq!(scene.resolve(&"walls_4".into()), None);

    let anchor = scene.anchor(&"walls_1".into()).expect("wall anchor");
    assert!((anchor.position[0] - 4.0).abs() < 1e-12);
    assert!((anchor.position[1] - 2.5).abs() < 1e-12);
    let facing = anchor.facing.expect("walls have a direction");
    assert!((facing[1] - 1.0).abs() < 1e-12);
}

#[test]
fn test_missing_position_starts_at_centroid() {
    let scene = SceneRegistry::new(room(), &[EntitySpec::new("chair", 0.5, 0.5, 0.8)], &[]).expect("scene");
    let chair = scene.entity(&"chair".into()).expect("chair");
    assert!((chair.position.x - 2.0).abs() < 1e-9);
    assert!((chair.position.y - 2.5).abs() < 1e-9);
    assert!((chair.position.z - 0.4).abs() < 1e-9);
}

#[test]
fn test_duplicate_ids_rejected() {
    let entities = [
        EntitySpec::new("bed", 2.0, 1.6, 0.5),
        EntitySpec::new("bed", 1.0, 1.0, 0.5),
    ];
    let err = SceneRegistry::new(room(), &entities, &[]).unwrap_err();
    assert_eq!(err, LayoutError::DuplicateId("bed".into()));

    // Furniture may not shadow a wall
    let err = SceneRegistry::new(room(), &[EntitySpec::new("walls_0", 1.0, 1.0, 1.0)], &[]).unwrap_err();
    assert!(matches!(err, LayoutError::DuplicateId(_)));

    let voids = [VoidSpec { id: "bed".into(), center: [2.0, 0.0], size: [0.9, 0.1], rotation: 0.0 }];
    let err = SceneRegistry::new(room(), &entities[..1], &voids).unwrap_err();
    assert!(matches!(err, LayoutError::DuplicateId(_)));
}

#[test]
fn test_invalid_footprint_rejected() {
    let err = SceneRegistry::new(room(), &[EntitySpec::new("flat", 0.0, 1.0, 1.0)], &[]).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidEntity { .. }));

    let err = SceneRegistry::new(room(), &[EntitySpec::new("nan", f64::NAN, 1.0, 1.0)], &[]).unwrap_err();
    assert!(matches!(err, LayoutError::InvalidEntity { .. }));
}

#[test]
fn test_rug_detection() {
    let entities = [
        EntitySpec::new("living_room_RUG", 2.0, 3.0, 0.01),
        EntitySpec::new("carpet", 2.0, 3.0, 0.01).with_category("Rug"),
        EntitySpec::new("sofa", 2.0, 1.0, 0.8),
    ];
    let scene = SceneRegistry::new(room(), &entities, &[]).expect("scene");
    let rugs: Vec<bool> = scene.entities().iter().map(|e| e.is_rug()).collect();
    assert_eq!(rugs, vec![true, true, false]);
}

#[test]
fn test_fixed_point_ids_skip_taken_names() {
    let mut scene = SceneRegistry::new(room(), &[EntitySpec::new("fixed_point_0", 1.0, 1.0, 1.0)], &[])
        .expect("scene");

    let mut pending = Vec::new();
    let first = scene.next_fixed_point_id(&pending);
    assert_eq!(first, EntityId::from("fixed_point_1"));
    pending.push(FixedPoint { id: first, position: [1.0, 1.0] });

    let second = scene.next_fixed_point_id(&pending);
    assert_eq!(second, EntityId::from("fixed_point_2"));
    pending.push(FixedPoint { id: second, position: [2.0, 2.0] });

    scene.add_fixed_points(pending);
    assert_eq!(scene.fixed_points().len(), 2);
    assert_eq!(scene.resolve(&"fixed_point_2".into()), Some(EntityRef::FixedPoint(1)));
    let anchor = scene.anchor(&"fixed_point_2".into()).expect("anchor");
    assert_eq!(anchor.position, [2.0, 2.0]);
    assert!(anchor.facing.is_none());
}

#[test]
fn test_apply_stacking() {
    let entities = [
        EntitySpec::new("table", 1.0, 1.0, 0.5),
        EntitySpec::new("lamp", 0.2, 0.2, 0.4),
    ];
    let mut scene = SceneRegistry::new(room(), &entities, &[]).expect("scene");
    let mut stacking = StackingMap::new();
    stacking.insert("lamp".into(), "table".into());
    stacking.insert("ghost".into(), "table".into());
    scene.apply_stacking(&stacking);

    assert_eq!(scene.entities()[1].stacked_on, Some(0));
    assert_eq!(scene.entities()[0].stacked_on, None);
}
