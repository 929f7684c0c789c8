#![doc = r"Measurement and line budget primitives for the linefold truncation engine."]

pub mod allocator;
pub mod document;
pub mod line_limit;
pub mod measurement;
pub mod reporter;
pub mod shadow;

pub use allocator::{allocate, VisibilityPlan, VisibleBlock};
pub use document::Document;
pub use line_limit::LineLimit;
pub use measurement::{MeasurementSnapshot, MeasurementStore, MergeOutcome};
pub use reporter::{MeasurementReporter, ReportWake};
pub use shadow::{shadow_pass_active, ShadowPass, ShadowPassConfig, ShadowPassOutcome};

#[cfg(test)]
#[path = "tests/measurement_tests.rs"]
mod measurement_tests;

#[cfg(test)]
#[path = "tests/allocator_tests.rs"]
mod allocator_tests;

#[cfg(test)]
#[path = "tests/reporter_tests.rs"]
mod reporter_tests;

#[cfg(test)]
#[path = "tests/shadow_tests.rs"]
mod shadow_tests;
