pub mod peaks;
pub mod pitch;
pub mod scoring;
pub mod spectrum;
pub mod synth;
pub mod windowing;
