//! Configuration for bind operations.
//!
//! [`BindSettings`] is constructed with [`SettingsBuilder`] and decides where
//! the stub image for produced executables comes from.

mod builder;
mod core;

pub use builder::SettingsBuilder;
pub use core::{BindSettings, StubSource};
