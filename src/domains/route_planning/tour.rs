use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::domains::arena::{Obstacle, Pose};

/// How candidate visit orders are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStrategy {
    /// Every permutation, ranked by tour length. Factorial in the obstacle count.
    #[default]
    Exhaustive,
    /// A single greedy tour: always drive to the closest unvisited approach pose.
    NearestNeighbor,
}

/// Euclidean length of `start -> approach(o1) -> ... -> approach(on)`.
pub fn tour_length(start: &Pose, obstacles: &[Obstacle], order: &[usize]) -> f64 {
    let mut length = 0.0;
    let mut from = *start;
    for &index in order {
        let to = obstacles[index].approach_pose();
        length += from.distance_to(&to);
        from = to;
    }
    length
}

/// All permutations of `0..n` in lexicographic order. `n == 0` yields one
/// empty permutation.
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut current: Vec<usize> = (0..n).collect();
    let mut all = vec![current.clone()];
    while next_permutation(&mut current) {
        all.push(current.clone());
    }
    all
}

fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut pivot = items.len() - 1;
    while pivot > 0 && items[pivot - 1] >= items[pivot] {
        pivot -= 1;
    }
    if pivot == 0 {
        return false;
    }
    let mut successor = items.len() - 1;
    while items[successor] <= items[pivot - 1] {
        successor -= 1;
    }
    items.swap(pivot - 1, successor);
    items[pivot..].reverse();
    true
}

/// Every visit order of `obstacles`, shortest tour first. Ties keep
/// lexicographic order.
pub fn ranked_tours(start: &Pose, obstacles: &[Obstacle]) -> Vec<Vec<usize>> {
    let mut ranked: Vec<(OrderedFloat<f64>, Vec<usize>)> = permutations(obstacles.len())
        .into_iter()
        .map(|order| (OrderedFloat(tour_length(start, obstacles, &order)), order))
        .collect();
    ranked.sort_by_key(|(length, _)| *length);
    ranked.into_iter().map(|(_, order)| order).collect()
}

pub fn nearest_neighbor_tour(start: &Pose, obstacles: &[Obstacle]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..obstacles.len()).collect();
    let mut order = Vec::with_capacity(obstacles.len());
    let mut from = *start;
    while let Some(position) = remaining
        .iter()
        .enumerate()
        .min_by_key(|(_, &index)| OrderedFloat(from.distance_to(&obstacles[index].approach_pose())))
        .map(|(position, _)| position)
    {
        let index = remaining.remove(position);
        from = obstacles[index].approach_pose();
        order.push(index);
    }
    order
}
