use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::{debug, trace};

use crate::domains::arena::{Arena, Cell, Heading, Pose, TurnRadii};
use crate::domains::motion::{Kinematics, MotionCommand};

/// Tuning of the constrained search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Turn cost is the arc length times this factor. Must exceed 1 so a turn
    /// always costs more than the straight run of the same length.
    pub turn_cost_multiplier: f64,
    /// Minimum number of intermediate arc poses checked for clearance before
    /// a turn is accepted. Every tick of the turn is checked regardless.
    pub turn_check_steps: u32,
}

impl SearchSettings {
    /// Cost of one 90° turn. Exceeds the distance between the turn's end
    /// points, which keeps the straight-line heuristic admissible.
    pub fn turn_cost(&self, radii: TurnRadii) -> f64 {
        radii.quarter_arc_length() * self.turn_cost_multiplier
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            turn_cost_multiplier: 3.0,
            turn_check_steps: 5,
        }
    }
}

/// Feasible leg between two poses.
#[derive(Debug, Clone, PartialEq)]
pub struct LegPlan {
    pub commands: Vec<MotionCommand>,
    /// Pose the robot ends the leg in, snapped to the goal cell.
    pub end_pose: Pose,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct SearchState {
    cell: Cell,
    heading: Heading,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Primitive {
    Straight(f64),
    Turn { angle: f64, reverse: bool },
}

impl Primitive {
    fn to_command(self, kinematics: &Kinematics) -> MotionCommand {
        match self {
            Primitive::Straight(distance) => MotionCommand::straight(distance, kinematics),
            Primitive::Turn { angle, reverse } => MotionCommand::turn(angle, reverse, kinematics),
        }
    }
}

const TURNS: [(f64, bool); 4] = [(90.0, false), (-90.0, false), (90.0, true), (-90.0, true)];

/// A* over `(cell, heading)` states. Poses are kept continuous while a
/// transition is checked and snapped to the cell centre once it is accepted.
pub struct PathSearch<'a> {
    arena: &'a Arena,
    kinematics: &'a Kinematics,
    settings: SearchSettings,
}

impl<'a> PathSearch<'a> {
    pub fn new(arena: &'a Arena, kinematics: &'a Kinematics, settings: SearchSettings) -> Self {
        Self {
            arena,
            kinematics,
            settings,
        }
    }

    /// Returns `None` when the goal cannot be reached from `start`.
    ///
    /// The start is treated as sitting on the centre of its cell, which is
    /// exact for every pose the planner produces.
    pub fn search(&self, start: Pose, goal: Pose) -> Option<LegPlan> {
        let cell_size = self.arena.spec.cell_size;
        let start = start.snapped(cell_size);
        let goal = goal.snapped(cell_size);

        if !self.arena.is_valid_position(&goal) {
            debug!(goal = %goal, "goal pose is not a valid robot position");
            return None;
        }

        let start_state = self.state_of(&start);
        let goal_state = self.state_of(&goal);
        if start_state == goal_state {
            return Some(LegPlan {
                commands: Vec::new(),
                end_pose: goal,
                cost: 0.0,
            });
        }

        let mut open = BinaryHeap::new();
        let mut closed: HashSet<SearchState> = HashSet::new();
        let mut best_cost: HashMap<SearchState, f64> = HashMap::new();
        let mut came_from: HashMap<SearchState, (SearchState, Primitive)> = HashMap::new();
        let mut poses: HashMap<SearchState, Pose> = HashMap::new();
        let mut sequence: u64 = 0;

        best_cost.insert(start_state, 0.0);
        poses.insert(start_state, start);
        open.push((
            Reverse(OrderedFloat(self.heuristic(&start, &goal))),
            Reverse(sequence),
            start_state,
        ));

        while let Some((_, _, state)) = open.pop() {
            if state == goal_state {
                let cost = best_cost.get(&state).copied().unwrap_or_default();
                debug!(
                    expanded = closed.len(),
                    cost,
                    "leg found {} -> {}",
                    start,
                    goal
                );
                return Some(self.reconstruct(goal_state, &came_from, goal, cost));
            }
            if !closed.insert(state) {
                continue;
            }

            let (Some(&pose), Some(&cost_so_far)) = (poses.get(&state), best_cost.get(&state)) else {
                continue;
            };

            for (next_pose, primitive, step_cost) in self.successors(&pose) {
                let next = self.state_of(&next_pose);
                if closed.contains(&next) {
                    continue;
                }
                let tentative = cost_so_far + step_cost;
                if best_cost.get(&next).map_or(true, |&known| tentative < known) {
                    best_cost.insert(next, tentative);
                    came_from.insert(next, (state, primitive));
                    poses.insert(next, next_pose);
                    sequence += 1;
                    open.push((
                        Reverse(OrderedFloat(tentative + self.heuristic(&next_pose, &goal))),
                        Reverse(sequence),
                        next,
                    ));
                }
            }
        }

        debug!(expanded = closed.len(), "no feasible leg {} -> {}", start, goal);
        None
    }

    fn state_of(&self, pose: &Pose) -> SearchState {
        SearchState {
            cell: self.arena.cell_of(pose),
            heading: pose.heading(),
        }
    }

    /// Straight-line distance; never more than the cheapest real path since a
    /// straight step costs its length and a turn costs more than its chord.
    fn heuristic(&self, pose: &Pose, goal: &Pose) -> f64 {
        pose.distance_to(goal)
    }

    fn successors(&self, pose: &Pose) -> Vec<(Pose, Primitive, f64)> {
        let cell_size = self.arena.spec.cell_size;
        let mut next = Vec::with_capacity(2 + TURNS.len());

        for distance in [cell_size, -cell_size] {
            let moved = pose.advanced(distance).snapped(cell_size);
            if self.arena.is_valid_position(&moved) {
                next.push((moved, Primitive::Straight(distance), cell_size));
            }
        }

        let turn_cost = self.settings.turn_cost(self.kinematics.radii);
        for (angle, reverse) in TURNS {
            match self.turn_end(pose, angle, reverse) {
                Some(end) => next.push((end, Primitive::Turn { angle, reverse }, turn_cost)),
                None => trace!(from = %pose, angle, reverse, "turn blocked"),
            }
        }
        next
    }

    /// End pose of a turn if every sampled point along the arc is clear.
    fn turn_end(&self, pose: &Pose, angle: f64, reverse: bool) -> Option<Pose> {
        let ticks = self.kinematics.ticks_for(self.kinematics.turn_duration(angle));
        let steps = self.settings.turn_check_steps.max(ticks).max(1);
        let step = angle / f64::from(steps);
        let axes = self.kinematics.radii.along_axes(pose.heading(), reverse);
        let mut sample = *pose;
        for _ in 0..steps {
            sample = sample.arced_on(step, reverse, axes);
            if !self.arena.is_valid_position(&sample) {
                return None;
            }
        }

        let end = pose
            .arced(angle, reverse, self.kinematics.radii)
            .snapped(self.arena.spec.cell_size);
        self.arena.is_valid_position(&end).then_some(end)
    }

    fn reconstruct(
        &self,
        goal_state: SearchState,
        came_from: &HashMap<SearchState, (SearchState, Primitive)>,
        end_pose: Pose,
        cost: f64,
    ) -> LegPlan {
        let mut primitives = Vec::new();
        let mut current = goal_state;
        while let Some(&(previous, primitive)) = came_from.get(&current) {
            primitives.push(primitive);
            current = previous;
        }
        primitives.reverse();

        LegPlan {
            commands: primitives
                .into_iter()
                .map(|p| p.to_command(self.kinematics))
                .collect(),
            end_pose,
            cost,
        }
    }
}
