#![doc = r"Testing utilities for the linefold truncation engine."]

pub mod renderer;
pub mod testing;

pub use renderer::{blocks, ReportMode, ScriptedBlock, ScriptedRenderer};
pub use testing::{run_truncation_test, TruncationTestRule};
