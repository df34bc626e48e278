//! File binding library.
//!
//! Combines several files into one self-extracting executable. When the
//! produced executable runs it writes the files to
//! `<temp>/<output stem> Binds/` and starts the ones flagged executable,
//! elevated where requested.
//!
//! # Example
//!
//! ```no_run
//! use file_binder::binder::{Binder, FileRegistry, SettingsBuilder};
//!
//! # async fn example() -> file_binder::binder::Result<()> {
//! let mut registry = FileRegistry::new();
//! registry.add_file("installer.exe", true, true).await?;
//! registry.add_file("license.txt", false, false).await?;
//!
//! let binder = Binder::new(SettingsBuilder::new().build());
//! let result = binder.bind(&registry, "Bundle.exe", None).await?;
//! println!("success: {}", result.success);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod payload;
pub mod registry;
pub mod settings;
pub mod stub;
pub mod utils;

pub use builder::{Binder, BuildResult, Diagnostic, DiagnosticSeverity};
pub use error::{Context, Error, ErrorExt, Result};
pub use payload::Payload;
pub use registry::{BoundFile, FileRegistry};
pub use settings::{BindSettings, SettingsBuilder, StubSource};
