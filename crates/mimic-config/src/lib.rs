//! # mimic-config
//!
//! Configuration for Mimic runs. Reads `mimic.toml`, then environment
//! variables, then CLI overrides, in increasing precedence.
//! Also loads persona files.

pub mod loader;
pub mod persona;
pub mod schema;

pub use loader::ConfigLoader;
pub use persona::load_persona;
pub use schema::MimicConfig;
pub use schema::{ConfigWarning, WarningSeverity};
