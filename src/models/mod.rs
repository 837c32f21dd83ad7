pub mod config;
pub mod render_request;

pub use config::{AppConfig, Toolchain};
pub use render_request::{MathMode, RenderRequest, DEFAULT_DPI};
