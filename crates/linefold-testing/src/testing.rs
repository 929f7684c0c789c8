use crate::renderer::{ScriptedBlock, ScriptedRenderer};
use linefold_core::{Runtime, RuntimeHandle};
use linefold_foundation::Document;
use linefold_runtime_std::StdRuntime;
use linefold_ui::{BridgeConfig, ExpandableConfig, ExpandableController, SyncHeightBridge};
use std::time::Duration;

/// Headless harness for exercising truncation engines in tests.
///
/// The rule owns a std-backed runtime on the current thread and offers
/// helpers to build controllers and bridges around a [`ScriptedRenderer`]
/// and to drive the runtime until all queued work has run.
pub struct TruncationTestRule {
    runtime: StdRuntime,
}

impl TruncationTestRule {
    pub fn new() -> Self {
        Self {
            runtime: StdRuntime::new(),
        }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.runtime()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.runtime_handle()
    }

    pub fn std_runtime(&self) -> &StdRuntime {
        &self.runtime
    }

    /// Builds a collapsed controller over `blocks`.
    pub fn controller(
        &self,
        renderer: &ScriptedRenderer,
        blocks: Vec<ScriptedBlock>,
        config: ExpandableConfig,
    ) -> ExpandableController<ScriptedRenderer> {
        ExpandableController::new(
            self.runtime_handle(),
            renderer.clone(),
            Document::new(blocks),
            config,
        )
    }

    /// Builds a controller and wraps it in a bridge.
    pub fn bridge(
        &self,
        renderer: &ScriptedRenderer,
        blocks: Vec<ScriptedBlock>,
        config: ExpandableConfig,
        bridge_config: BridgeConfig,
    ) -> SyncHeightBridge<ScriptedRenderer> {
        SyncHeightBridge::new(self.controller(renderer, blocks, config), bridge_config)
    }

    /// Drain queued tasks, endpoint calls and measurement batches until the
    /// runtime has nothing left to do.
    pub fn pump_until_idle(&self) {
        let runtime = self.runtime.runtime();
        let mut rounds = 0;
        loop {
            rounds += 1;
            if rounds > 100 {
                panic!("pump_until_idle looped too many times!");
            }
            runtime.drain_ui();
            self.runtime.take_frame_request();
            if !runtime.needs_frame() {
                break;
            }
        }
    }

    /// Pumps the runtime, waiting for work from other threads, until `done`
    /// holds or `timeout` elapses.
    pub fn pump_until(&self, timeout: Duration, done: impl FnMut() -> bool) -> bool {
        self.runtime.run_until(timeout, done)
    }
}

impl Default for TruncationTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TruncationTestRule`.
pub fn run_truncation_test<R>(f: impl FnOnce(&mut TruncationTestRule) -> R) -> R {
    let mut rule = TruncationTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
