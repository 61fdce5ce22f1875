pub mod arena;
pub mod execution;
pub mod logger;
pub mod motion;
pub mod path_planning;
pub mod route_planning;

pub use arena::*;
pub use execution::{
    CycleStatus, ExecutionEvent, ExecutionSettings, Executor, ReplanState, Robot, EXECUTOR_AGGREGATE_TYPE,
};
pub use logger::*;
pub use motion::*;
pub use path_planning::*;
pub use route_planning::{
    compress_commands, nearest_neighbor_tour, permutations, ranked_tours, tour_length, PlanOutcome,
    PlannerSettings, PlannerState, Route, RoutePlanner, RoutePlanningEvent, TourStrategy,
};
