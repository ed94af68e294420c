//! Frame assembly and end-of-turn state machine.

pub mod assembler;
pub mod turn;

pub use assembler::FrameAssembler;
pub use turn::{TurnSegmenter, TurnState};
