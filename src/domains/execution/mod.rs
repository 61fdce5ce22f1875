pub mod events;
pub mod executor;
pub mod robot;

pub use events::*;
pub use executor::*;
pub use robot::*;
