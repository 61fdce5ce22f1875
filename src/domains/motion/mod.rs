pub mod command;
pub mod kinematics;
pub mod perimeter;
pub mod ports;
pub mod recognition;

pub use command::*;
pub use kinematics::*;
pub use perimeter::*;
pub use ports::*;
pub use recognition::*;
