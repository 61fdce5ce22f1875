pub mod channel_recognizer;
pub mod scripted_recognizer;

pub use channel_recognizer::*;
pub use scripted_recognizer::*;
