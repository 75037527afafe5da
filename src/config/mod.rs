pub mod core;
pub mod rendering;
pub mod window;

pub use self::core::{AppConfig, Overrides};
pub use rendering::{FailurePolicy, RenderConfig};
pub use window::WindowConfig;
