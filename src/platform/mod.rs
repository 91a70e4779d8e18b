//! Platform abstraction layer
//!
//! Window and event plumbing lives outside the crate; this module defines
//! what it must deliver.

pub mod input;

pub use input::{InputEvent, Key};
