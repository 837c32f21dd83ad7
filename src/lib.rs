//! texpng - LaTeX math to PNG
//!
//! Local HTTP service that typesets a math expression with pdflatex and
//! rasterizes it with Ghostscript. This library exposes modules for
//! integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
