//! Utility types and functions for the renderer core.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`Aabb`] and math helpers, plus glam re-exports
//! - [`init_logging`] - log/tracing handler setup

mod error;
mod logging;
mod math;

pub use error::*;
pub use logging::*;
pub use math::*;
