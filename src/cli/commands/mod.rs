//! Command execution functions.
//!
//! Each command returns the process exit code.

mod bind;
mod inspect;

pub use bind::{collect_registry, execute_bind};
pub use inspect::execute_inspect;
