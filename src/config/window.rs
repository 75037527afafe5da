use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Hello GL".to_string(),
            width: 400,
            height: 400,
            min_width: 50,
            min_height: 50,
            vsync: true,
        }
    }
}

impl WindowConfig {
    /// Initial size, never smaller than the minimum.
    pub fn size_hint(&self) -> (u32, u32) {
        (
            self.width.max(self.min_width),
            self.height.max(self.min_height),
        )
    }

    pub fn minimum_size_hint(&self) -> (u32, u32) {
        (self.min_width, self.min_height)
    }
}
