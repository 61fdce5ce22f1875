pub mod events;
pub mod planner;
pub mod route;
pub mod tour;

pub use events::*;
pub use planner::*;
pub use route::*;
pub use tour::*;
