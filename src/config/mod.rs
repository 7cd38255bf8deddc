//! Local settings and vault directory resolution.

pub mod settings;

pub use settings::{resolve_vault_dir, Settings, TreeGlyphs, TreeStyle};
