//! Render contract
//!
//! The GPU pipeline lives outside the crate. This module defines the data it
//! consumes: instanced block boxes with object tags and highlight hints.

pub mod frame;
pub mod instance;

pub use frame::{HelpKey, MessageKey, RenderFrame, build_frame};
pub use instance::{BlockInstance, Highlight};
