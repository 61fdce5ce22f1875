pub mod grid;
pub mod layout;
pub mod obstacle;
pub mod pose;

pub use grid::*;
pub use layout::*;
pub use obstacle::*;
pub use pose::*;
