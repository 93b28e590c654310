//! # Presentation
//!
//! Turns states and failures into text. Nothing in `core` depends on this.

pub mod console;
pub mod error_mapper;

pub use error_mapper::{DisplayMessage, map_failure, map_kind};
