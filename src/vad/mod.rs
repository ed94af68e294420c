//! Per-frame voice activity classification.

pub mod classifier;
pub mod energy;

pub use classifier::{FrameClassifier, ScriptedClassifier};
pub use energy::EnergyClassifier;
