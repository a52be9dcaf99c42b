//! Pre-solve consistency pass.
//!
//! Turns the caller's raw request list into a clean constraint set:
//! resolves ids, drops duplicates and unsupported combinations, retargets
//! AgainstWall to the nearest wall and clamps distance bounds against the
//! current layout. Every request produces exactly one transcript entry.

mod log;
pub use log::{FilterDecision, FilterLogEntry, RejectReason, Rewrite};

#[cfg(test)]
mod tests_filter;

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::constraints::{Constraint, ConstraintKind, ConstraintRequest, Target};
use crate::geometry::utils_2d::distance;
use crate::scene::{Anchor, EntityId, EntityRef, FixedPoint, SceneRegistry, StackingMap};

/// Unordered entity pairs excluded from overlap repulsion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludedPairs(BTreeSet<(EntityId, EntityId)>);

impl ExcludedPairs {
    fn key(a: &EntityId, b: &EntityId) -> (EntityId, EntityId) {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    pub fn insert(&mut self, a: &EntityId, b: &EntityId) -> bool {
        self.0.insert(Self::key(a, b))
    }

    pub fn contains(&self, a: &EntityId, b: &EntityId) -> bool {
        self.0.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything the solver and post-processor need from the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutput {
    pub constraints: Vec<Constraint>,
    pub stacking: StackingMap,
    pub excluded: ExcludedPairs,
    /// Anchors to register before solving.
    pub fixed_points: Vec<FixedPoint>,
    pub transcript: Vec<FilterLogEntry>,
}

/// Negative and non-finite bounds count as missing.
fn sanitize_bound(bound: Option<f64>) -> Option<f64> {
    bound.filter(|b| b.is_finite() && *b >= 0.0)
}

/// Clamp requested distance bounds so they are feasible from the current layout.
///
/// `min' = max(min(min, current), floor)` and
/// `max' = max(max, current, 1.5 * floor)`, where `floor` is the sum of the
/// two half-minor footprints. Missing bounds stay missing. The result is
/// always ordered and applying it twice changes nothing.
pub fn clamp_distance_bounds(
    min: Option<f64>,
    max: Option<f64>,
    current: f64,
    floor: f64,
) -> (Option<f64>, Option<f64>) {
    let (mut min, mut max) = (sanitize_bound(min), sanitize_bound(max));
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            min = Some(hi);
            max = Some(lo);
        }
    }
    let min = min.map(|m| m.min(current).max(floor));
    let max = max.map(|m| m.max(current).max(1.5 * floor));
    (min, max)
}

/// Running bookkeeping while requests are admitted in order.
#[derive(Default)]
struct FilterState {
    output: FilterOutput,
    has_wall: HashSet<EntityId>,
    has_orientation: HashSet<EntityId>,
    distance_count: HashMap<EntityId, usize>,
    seen: HashSet<(&'static str, EntityId, String)>,
}

/// Resolved request target.
enum Resolved {
    Entity(EntityId, Anchor),
    Point([f64; 2]),
}

pub struct ConsistencyFilter;

impl ConsistencyFilter {
    pub fn apply(scene: &SceneRegistry, requests: &[ConstraintRequest], config: &SolverConfig) -> FilterOutput {
        let mut state = FilterState::default();

        for (index, request) in requests.iter().enumerate() {
            let decision = match Self::admit(scene, request, config, &mut state) {
                Ok(rewrite) => rewrite.map(FilterDecision::Rewritten).unwrap_or(FilterDecision::Accepted),
                Err(reason) => FilterDecision::Rejected(reason),
            };

            let kind = request.kind.label();
            let target = request.target.as_ref().map(|t| t.to_string());
            let message = log::describe(kind, &request.subject, target.as_deref(), &decision);
            match &decision {
                FilterDecision::Rejected(_) => warn!(index, "{}", message),
                _ => debug!(index, "{}", message),
            }

            state.output.transcript.push(FilterLogEntry {
                index,
                kind: kind.to_string(),
                subject: request.subject.clone(),
                target,
                decision,
                message,
            });
        }

        debug!(
            requested = requests.len(),
            accepted = state.output.constraints.len(),
            stacked = state.output.stacking.len(),
            "consistency filter done"
        );
        state.output
    }

    fn resolve_target(
        scene: &SceneRegistry,
        request: &ConstraintRequest,
    ) -> Result<Resolved, RejectReason> {
        match request.target.as_ref().ok_or(RejectReason::MissingTarget)? {
            Target::Point(p) => {
                if !p[0].is_finite() || !p[1].is_finite() {
                    return Err(RejectReason::InvalidParameter("non-finite target point".into()));
                }
                Ok(Resolved::Point(*p))
            }
            Target::Entity(id) => {
                if *id == request.subject {
                    return Err(RejectReason::SelfReference);
                }
                let anchor = scene.anchor(id).ok_or_else(|| RejectReason::UnknownEntity(id.clone()))?;
                Ok(Resolved::Entity(id.clone(), anchor))
            }
        }
    }

    /// Which target categories each kind accepts.
    fn target_allowed(kind: &ConstraintKind, target: &Resolved) -> bool {
        let reference = match target {
            Resolved::Point(_) => {
                return matches!(kind, ConstraintKind::Distance { .. } | ConstraintKind::PointTowards { .. })
            }
            Resolved::Entity(_, anchor) => anchor.reference,
        };
        match kind {
            ConstraintKind::Distance { .. } => true,
            ConstraintKind::PointTowards { .. } => {
                matches!(reference, EntityRef::Furniture(_) | EntityRef::FixedPoint(_))
            }
            ConstraintKind::AlignWith { .. } => matches!(reference, EntityRef::Furniture(_) | EntityRef::Wall(_)),
            ConstraintKind::OnTopOf | ConstraintKind::SkipOverlap => matches!(reference, EntityRef::Furniture(_)),
            ConstraintKind::AgainstWall => true,
        }
    }

    fn admit(
        scene: &SceneRegistry,
        request: &ConstraintRequest,
        config: &SolverConfig,
        state: &mut FilterState,
    ) -> Result<Option<Rewrite>, RejectReason> {
        let subject_index = match scene.resolve(&request.subject) {
            None => return Err(RejectReason::UnknownEntity(request.subject.clone())),
            Some(EntityRef::Furniture(i)) => i,
            Some(_) => return Err(RejectReason::InvalidSubject(request.subject.clone())),
        };
        let subject = &scene.entities()[subject_index];
        if !subject.movable {
            return Err(RejectReason::FrozenSubject(request.subject.clone()));
        }

        if let ConstraintKind::AgainstWall = request.kind {
            return Self::admit_against_wall(scene, request, subject.xy(), state);
        }

        let target = Self::resolve_target(scene, request)?;
        if !Self::target_allowed(&request.kind, &target) {
            return Err(RejectReason::InvalidTarget {
                kind: request.kind.label().to_string(),
                target: request.target.as_ref().map(|t| t.to_string()).unwrap_or_default(),
            });
        }

        let key_target = match &target {
            Resolved::Entity(id, _) => id.to_string(),
            Resolved::Point(p) => format!("({}, {})", p[0], p[1]),
        };
        let key = (request.kind.label(), request.subject.clone(), key_target);
        if state.seen.contains(&key) {
            return Err(RejectReason::Duplicate);
        }

        let mut kind = request.kind.clone();
        let mut rewrite = None;
        match &mut kind {
            ConstraintKind::Distance { min, max, weight } => {
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(RejectReason::InvalidParameter(format!("weight {}", weight)));
                }
                let (target_pos, target_half_minor, is_void) = match &target {
                    Resolved::Entity(_, anchor) => {
                        if anchor.on_ceiling {
                            return Err(RejectReason::CeilingDistance);
                        }
                        (anchor.position, anchor.half_minor, matches!(anchor.reference, EntityRef::Void(_)))
                    }
                    Resolved::Point(p) => (*p, 0.0, false),
                };
                if subject.on_ceiling {
                    return Err(RejectReason::CeilingDistance);
                }
                let count = state.distance_count.get(&request.subject).copied().unwrap_or(0);
                if !is_void && count >= config.max_distance_constraints {
                    return Err(RejectReason::TooManyDistances { limit: config.max_distance_constraints });
                }

                let current = distance(subject.xy(), target_pos);
                let floor = subject.half_minor() + target_half_minor;
                let requested = [*min, *max];
                let (lo, hi) = clamp_distance_bounds(*min, *max, current, floor);
                if requested != [lo, hi] {
                    rewrite = Some(Rewrite::DistanceBounds { requested, clamped: [lo, hi] });
                }
                *min = lo;
                *max = hi;
                if !is_void {
                    state.distance_count.insert(request.subject.clone(), count + 1);
                }
            }
            ConstraintKind::PointTowards { angle } | ConstraintKind::AlignWith { angle } => {
                if !angle.is_finite() {
                    return Err(RejectReason::InvalidParameter(format!("angle {}", angle)));
                }
                if !state.has_orientation.insert(request.subject.clone()) {
                    return Err(RejectReason::DuplicateOrientation);
                }
            }
            ConstraintKind::OnTopOf => {
                let base = match &target {
                    Resolved::Entity(id, _) => id,
                    Resolved::Point(_) => return Err(RejectReason::MissingTarget),
                };
                if let Some(existing) = state.output.stacking.get(&request.subject) {
                    return Err(RejectReason::DuplicateParent(existing.clone()));
                }
                // Walk down from the base; reaching the subject means a loop
                let mut cursor = Some(base);
                while let Some(id) = cursor {
                    if *id == request.subject {
                        return Err(RejectReason::StackingCycle);
                    }
                    cursor = state.output.stacking.get(id);
                }
                state.output.stacking.insert(request.subject.clone(), base.clone());
                state.output.excluded.insert(&request.subject, base);
            }
            ConstraintKind::SkipOverlap => {
                if let Resolved::Entity(other, _) = &target {
                    state.output.excluded.insert(&request.subject, other);
                }
            }
            ConstraintKind::AgainstWall => {}
        }

        let target_id = match target {
            Resolved::Entity(id, _) => id,
            Resolved::Point(p) => {
                let id = scene.next_fixed_point_id(&state.output.fixed_points);
                state.output.fixed_points.push(FixedPoint { id: id.clone(), position: p });
                id
            }
        };

        state.seen.insert(key);
        state.output.constraints.push(Constraint {
            kind,
            subject: request.subject.clone(),
            target: target_id,
        });
        Ok(rewrite)
    }

    fn admit_against_wall(
        scene: &SceneRegistry,
        request: &ConstraintRequest,
        position: [f64; 2],
        state: &mut FilterState,
    ) -> Result<Option<Rewrite>, RejectReason> {
        if state.has_wall.contains(&request.subject) {
            return Err(RejectReason::DuplicateWall);
        }
        let wall = scene
            .room()
            .nearest_wall(position)
            .ok_or_else(|| RejectReason::InvalidParameter("room has no walls".into()))?;
        let chosen = SceneRegistry::wall_id(wall);

        let requested = request.target.as_ref().map(|t| t.to_string());
        let rewrite = if requested.as_deref() == Some(chosen.as_str()) {
            None
        } else {
            Some(Rewrite::WallTarget { requested, chosen: chosen.clone() })
        };

        state.has_wall.insert(request.subject.clone());
        state.output.constraints.push(Constraint {
            kind: ConstraintKind::AgainstWall,
            subject: request.subject.clone(),
            target: chosen,
        });
        Ok(rewrite)
    }
}
