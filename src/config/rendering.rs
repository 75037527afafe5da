use serde::{Deserialize, Serialize};

/// What the pipeline does when a stage fails to compile or the program fails
/// to link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the driver message and keep going with whatever objects exist.
    #[default]
    LogAndContinue,
    /// Release everything created so far and stay uninitialized.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Request an alpha channel and clear to a transparent colour.
    pub transparent: bool,
    pub clear_color: [f32; 4],
    pub failure_policy: FailurePolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            transparent: false,
            clear_color: [0.2, 0.3, 0.3, 1.0],
            failure_policy: FailurePolicy::LogAndContinue,
        }
    }
}

impl RenderConfig {
    /// The colour `paint` clears to. Transparent surfaces get alpha 0.
    pub fn effective_clear_color(&self) -> [f32; 4] {
        let [r, g, b, a] = self.clear_color;
        if self.transparent {
            [r, g, b, 0.0]
        } else {
            [r, g, b, a]
        }
    }

    /// Alpha bits to ask the surface format for.
    pub fn alpha_size(&self) -> u8 {
        if self.transparent {
            8
        } else {
            0
        }
    }
}
