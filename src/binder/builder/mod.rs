//! Bind orchestration and executable assembly.
//!
//! This module provides the [`Binder`] orchestrator that turns a
//! [`FileRegistry`](crate::binder::FileRegistry) into a self-extracting
//! executable.
//!
//! # Overview
//!
//! The binder:
//! 1. Checks the bind preconditions and raises the first violation
//! 2. Removes any previous output
//! 3. Encodes the registered files into a text payload
//! 4. Copies the stub image, applies the icon, and appends the payload
//! 5. Returns a [`BuildResult`] with diagnostics, size, and checksum
//!
//! # Module Organization
//!
//! - [`orchestrator`] - Main [`Binder`] struct
//! - [`validation`] - Bind preconditions
//! - [`assemble`] - Stub image plus payload overlay, written atomically
//! - [`stub_image`] - Stub loading and object format detection
//! - [`icon`] - `.ico` parsing and Windows resource embedding
//! - [`checksum`] - SHA256 checksum of the produced executable
//! - [`result`] - [`BuildResult`] and [`Diagnostic`]

mod assemble;
mod checksum;
mod icon;
mod orchestrator;
mod result;
mod stub_image;
mod validation;

pub use orchestrator::Binder;
pub use result::{BuildResult, Diagnostic, DiagnosticSeverity};
pub use validation::{ICON_EXTENSION, MIN_FILES};
