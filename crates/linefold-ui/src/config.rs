//! Host-facing configuration.

use linefold_foundation::{LineLimit, ShadowPassConfig};
use std::time::Duration;

pub const DEFAULT_SEE_MORE_TEXT: &str = "...See more";
pub const DEFAULT_SEE_LESS_TEXT: &str = "See less";
pub const DEFAULT_BLOCK_SPACING: f32 = 8.0;
pub const DEFAULT_FALLBACK_WIDTH: f32 = 390.0;

/// Presentation settings for an [`ExpandableController`](crate::ExpandableController).
#[derive(Clone, Debug, PartialEq)]
pub struct ExpandableConfig {
    pub line_limit: LineLimit,
    /// Toggle label while collapsed.
    pub see_more_text: String,
    /// Toggle label while expanded.
    pub see_less_text: String,
    /// Vertical gap between stacked blocks, and between content and toggle.
    pub block_spacing: f32,
    pub shadow: ShadowPassConfig,
}

impl ExpandableConfig {
    pub fn with_line_limit(mut self, line_limit: LineLimit) -> Self {
        self.line_limit = line_limit;
        self
    }

    pub fn with_labels(mut self, see_more: impl Into<String>, see_less: impl Into<String>) -> Self {
        self.see_more_text = see_more.into();
        self.see_less_text = see_less.into();
        self
    }

    pub fn with_block_spacing(mut self, spacing: f32) -> Self {
        self.block_spacing = spacing;
        self
    }

    /// Label for the toggle control, or `None` when truncation is off.
    pub fn toggle_label(&self, expanded: bool) -> Option<&str> {
        if !self.line_limit.is_limited() {
            return None;
        }
        Some(if expanded {
            &self.see_less_text
        } else {
            &self.see_more_text
        })
    }
}

impl Default for ExpandableConfig {
    fn default() -> Self {
        Self {
            line_limit: LineLimit::default(),
            see_more_text: DEFAULT_SEE_MORE_TEXT.to_owned(),
            see_less_text: DEFAULT_SEE_LESS_TEXT.to_owned(),
            block_spacing: DEFAULT_BLOCK_SPACING,
            shadow: ShadowPassConfig::default(),
        }
    }
}

/// Settings for a [`SyncHeightBridge`](crate::SyncHeightBridge).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Width used when the host asks for a layout before it has one.
    pub fallback_width: f32,
    /// Upper bound for cross-thread measure calls. `None` waits for the
    /// owner thread indefinitely.
    pub sync_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            fallback_width: DEFAULT_FALLBACK_WIDTH,
            sync_timeout: None,
        }
    }
}
