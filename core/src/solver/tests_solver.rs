use super::projection::{pin_heights, project_into_room, settle, snap_facings};
use super::{colliding_pairs, CancelToken, GradientSolver, ParamLayout, SolveContext};
use crate::config::SolverConfig;
use crate::consistency::ExcludedPairs;
use crate::constraints::{Constraint, ConstraintKind};
use crate::geometry::BOUNDARY_EPSILON;
use crate::scene::{EntitySpec, SceneRegistry, StackingMap};

fn room() -> Vec<[f64; 2]> {
    vec![[0.0, 0.0], [4.0, 0.0], [4.0, 5.0], [0.0, 5.0]]
}

fn context(entities: &[EntitySpec], constraints: Vec<Constraint>) -> SolveContext {
    let scene = SceneRegistry::new(room(), entities, &[]).expect("scene");
    SolveContext::new(scene, constraints, ExcludedPairs::default())
}

fn all_inside(ctx: &SolveContext) -> bool {
    ctx.scene
        .entities()
        .iter()
        .all(|e| !ctx.scene.room().violates_boundary(&e.polygon(), BOUNDARY_EPSILON))
}

#[test]
fn test_param_layout_skips_frozen_and_stacked_positions() {
    let entities = [
        EntitySpec::new("sofa", 2.0, 1.0, 0.8).at(2.0, 0.5, 0.4).frozen(),
        EntitySpec::new("table", 1.0, 1.0, 0.5).at(2.0, 2.0, 0.25),
        EntitySpec::new("lamp", 0.2, 0.2, 0.4).at(2.0, 2.0, 0.7),
    ];
    let mut scene = SceneRegistry::new(room(), &entities, &[]).expect("scene");
    let mut stacking = StackingMap::new();
    stacking.insert("lamp".into(), "table".into());
    scene.apply_stacking(&stacking);

    let layout = ParamLayout::new(&scene);
    // table: x, y, ux, uy; lamp: ux, uy
    assert_eq!(layout.len(), 6);
    assert_eq!(layout.slots().len(), 2);
    assert!(layout.slots()[1].position.is_none());
}

#[test]
fn test_no_movable_entities_is_a_noop() {
    let entities = [EntitySpec::new("wardrobe", 1.0, 0.6, 2.0).at(-3.0, 1.0, 1.0).frozen()];
    let mut ctx = context(&entities, vec![]);
    let stats = GradientSolver::new(&SolverConfig::default()).run(&mut ctx, &CancelToken::new());
    assert_eq!(stats.iterations, 0);
    assert!(stats.best_loss.is_none());
    // Untouched even though it is outside the room
    assert_eq!(ctx.scene.entities()[0].position.x, -3.0);
}

#[test]
fn test_projection_pulls_entity_inside() {
    let entities = [EntitySpec::new("desk", 1.2, 0.6, 0.75).at(4.3, 2.0, 0.0)];
    let mut ctx = context(&entities, vec![]);
    let moves = project_into_room(&mut ctx.scene, &SolverConfig::default());
    assert!(moves >= 1);
    assert!(all_inside(&ctx));
    let desk = &ctx.scene.entities()[0];
    assert!((desk.position.z - 0.375).abs() < 1e-12);
    // Rotation 0: width along x, so the right edge sits on x = 4
    assert!((desk.position.x - 3.4).abs() < 1e-9);
}

#[test]
fn test_pin_heights_stacking_chain() {
    let entities = [
        EntitySpec::new("table", 1.0, 1.0, 0.5).at(1.0, 1.0, 0.25).frozen(),
        EntitySpec::new("tray", 0.4, 0.3, 0.05).at(3.0, 3.0, 0.0),
        EntitySpec::new("cup", 0.1, 0.1, 0.1).at(2.0, 4.0, 0.0),
        EntitySpec::new("pendant", 0.5, 0.5, 0.3).at(2.0, 2.0, 0.0).on_ceiling(),
    ];
    let mut scene = SceneRegistry::new(room(), &entities, &[]).expect("scene");
    let mut stacking = StackingMap::new();
    stacking.insert("cup".into(), "tray".into());
    stacking.insert("tray".into(), "table".into());
    scene.apply_stacking(&stacking);

    let config = SolverConfig::default();
    pin_heights(&mut scene, &config);

    let tray = &scene.entities()[1];
    let cup = &scene.entities()[2];
    assert_eq!(tray.xy(), [1.0, 1.0]);
    assert_eq!(cup.xy(), [1.0, 1.0]);
    assert!((tray.position.z - 0.525).abs() < 1e-12);
    assert!((cup.position.z - 0.1).abs() < 1e-12);
    assert!((scene.entities()[3].position.z - config.ceiling_height).abs() < 1e-12);
    // Frozen keeps its height
    assert!((scene.entities()[0].position.z - 0.25).abs() < 1e-12);
}

#[test]
fn test_coincident_boxes_separate() {
    let entities = [
        EntitySpec::new("box_a", 1.0, 1.0, 1.0).at(1.0, 1.0, 0.5),
        EntitySpec::new("box_b", 1.0, 1.0, 1.0).at(1.0, 1.0, 0.5),
    ];
    let mut ctx = context(&entities, vec![]);
    let stats = GradientSolver::new(&SolverConfig::default()).run(&mut ctx, &CancelToken::new());

    assert_eq!(stats.iterations, 400);
    assert!(stats.initial_loss.unwrap_or(0.0) > 0.0);
    assert!(colliding_pairs(&ctx.scene, &ctx.excluded).is_empty());
    assert!(all_inside(&ctx));
}

#[test]
fn test_against_wall_converges() {
    let entities = [EntitySpec::new("chair", 0.5, 0.5, 0.9).at(2.0, 2.0, 0.45).rotated(2.8)];
    let constraints = vec![Constraint {
        kind: ConstraintKind::AgainstWall,
        subject: "chair".into(),
        target: "walls_0".into(),
    }];
    let mut ctx = context(&entities, constraints);
    let stats = GradientSolver::new(&SolverConfig::default()).run(&mut ctx, &CancelToken::new());

    let chair = &ctx.scene.entities()[0];
    assert!((chair.position.y - 0.25).abs() < 0.1, "chair y = {}", chair.position.y);
    assert!(chair.facing[1] > 0.99, "chair facing = {:?}", chair.facing);
    assert!(stats.best_loss.unwrap_or(f64::INFINITY) < stats.initial_loss.unwrap_or(0.0));
}

#[test]
fn test_cancelled_before_start_still_projects() {
    let entities = [EntitySpec::new("desk", 1.2, 0.6, 0.75).at(4.5, 2.0, 0.0)];
    let mut ctx = context(&entities, vec![]);
    let cancel = CancelToken::new();
    cancel.cancel();
    let stats = GradientSolver::new(&SolverConfig::default()).run(&mut ctx, &cancel);
    assert!(stats.cancelled);
    assert_eq!(stats.iterations, 0);
    assert!(all_inside(&ctx));
}

#[test]
fn test_non_finite_steps_are_skipped() {
    let entities = [EntitySpec::new("desk", 1.2, 0.6, 0.75).at(2.0, 2.0, 0.375)];
    let mut ctx = context(&entities, vec![]);
    ctx.scene.entities_mut()[0].position.x = f64::NAN;
    let config = SolverConfig::default().with_iterations(5);
    let stats = GradientSolver::new(&config).run(&mut ctx, &CancelToken::new());
    assert_eq!(stats.iterations, 5);
    assert_eq!(stats.skipped_steps, 5);
    assert!(stats.best_loss.is_none());
}

#[test]
fn test_snap_facings_moves_onto_grid() {
    let entities = [
        EntitySpec::new("chair", 0.5, 0.5, 0.9).at(2.0, 2.0, 0.45).rotated(0.3),
        EntitySpec::new("shelf", 1.0, 0.3, 2.0).at(1.0, 4.0, 1.0).rotated(0.3).frozen(),
    ];
    let mut ctx = context(&entities, vec![]);
    snap_facings(&mut ctx.scene, &SolverConfig::default());

    // rz 0.3 snaps to 0, which faces -y
    let chair = &ctx.scene.entities()[0];
    assert!(chair.facing[0].abs() < 1e-12 && (chair.facing[1] + 1.0).abs() < 1e-12);
    let shelf = &ctx.scene.entities()[1];
    assert!((shelf.facing[0] - (0.3f64 - std::f64::consts::FRAC_PI_2).cos()).abs() < 1e-12);
}

#[test]
fn test_settle_clears_overlaps_and_escapes() {
    let entities = [
        EntitySpec::new("desk", 1.2, 0.6, 0.75).at(0.5, 4.0, 0.375),
        EntitySpec::new("chair", 0.5, 0.5, 0.9).at(2.2, 2.6, 0.45),
        EntitySpec::new("cabinet", 1.0, 0.5, 1.0).at(2.0, 2.5, 0.5).frozen(),
    ];
    let mut ctx = context(&entities, vec![]);
    let config = SolverConfig::default();
    assert!(!colliding_pairs(&ctx.scene, &ctx.excluded).is_empty());

    let rounds = settle(&mut ctx.scene, &ctx.excluded, &config);
    // One round to fix, one to confirm nothing moves
    assert_eq!(rounds, 1);
    assert!(colliding_pairs(&ctx.scene, &ctx.excluded).is_empty());
    assert!(all_inside(&ctx));
    // Frozen entities are never pushed
    assert_eq!(ctx.scene.entities()[2].xy(), [2.0, 2.5]);
    // Chair took the shallow way out, upward
    assert!((ctx.scene.entities()[1].position.y - 3.0).abs() < 1e-3);
}
