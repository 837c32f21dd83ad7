pub mod health;
pub mod render;

pub use health::{handle_health, HealthResponse, __path_handle_health};
pub use render::{handle_render, RenderErrorResponse, __path_handle_render};
