#![doc = r"Expandable document presentation and host integration for linefold."]

pub mod bridge;
pub mod config;
pub mod controller;
pub mod host;
pub mod renderer;

pub use bridge::{BridgeHandle, SyncHeightBridge};
pub use config::{BridgeConfig, ExpandableConfig};
pub use controller::ExpandableController;
pub use host::{BlockParser, DocumentHost, DocumentHostBuilder, TextPreprocessor};
pub use renderer::{BlockRenderer, RenderDirective, RenderPass};

pub use linefold_foundation::{
    allocate, Document, LineLimit, MeasurementReporter, MeasurementSnapshot, VisibilityPlan,
    VisibleBlock,
};

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod bridge_tests;

#[cfg(test)]
#[path = "tests/host_tests.rs"]
mod host_tests;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
